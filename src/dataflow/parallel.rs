//! Order-preserving multi-threaded map.

use super::DataFlow;
use crate::error::{Error, Result};
use crossbeam_channel::{bounded, Receiver};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

type Mapper<T, U> = Arc<dyn Fn(T) -> Result<U> + Send + Sync>;

/// Applies a mapping on worker threads and yields results in source order.
///
/// A feeder thread pulls items from the source into a bounded job channel;
/// workers send `(sequence, result)` pairs back and the iterator reorders
/// them. A panicking mapper yields an error in place of its item. Dropping
/// the iterator closes the channels, which stops the feeder and the workers
/// at their next send.
pub struct MultiThreadMapData<U> {
    results: Receiver<(usize, Result<U>)>,
    pending: BTreeMap<usize, Result<U>>,
    next: usize,
}

impl<U: Send + 'static> MultiThreadMapData<U> {
    /// Spawn `workers` threads mapping `source` with `f`.
    ///
    /// `buffer` bounds the number of items in flight per channel.
    pub fn new<T, F>(source: DataFlow<T>, workers: usize, buffer: usize, f: F) -> Self
    where
        T: Send + 'static,
        F: Fn(T) -> Result<U> + Send + Sync + 'static,
    {
        let workers = workers.max(1);
        let buffer = buffer.max(1);
        let (job_tx, job_rx) = bounded::<(usize, Result<T>)>(buffer);
        let (result_tx, result_rx) = bounded::<(usize, Result<U>)>(buffer);
        let mapper: Mapper<T, U> = Arc::new(f);

        thread::spawn(move || {
            for (seq, item) in source.enumerate() {
                if job_tx.send((seq, item)).is_err() {
                    break;
                }
            }
        });

        for worker in 0..workers {
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            let mapper = Arc::clone(&mapper);
            thread::spawn(move || {
                for (seq, item) in jobs.iter() {
                    let mapped = item.and_then(|value| {
                        catch_unwind(AssertUnwindSafe(|| mapper(value)))
                            .unwrap_or_else(|panic| Err(panic_error(seq, panic)))
                    });
                    if results.send((seq, mapped)).is_err() {
                        break;
                    }
                }
                log::debug!("map worker {} finished", worker);
            });
        }

        Self {
            results: result_rx,
            pending: BTreeMap::new(),
            next: 0,
        }
    }
}

impl<U> Iterator for MultiThreadMapData<U> {
    type Item = Result<U>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.remove(&self.next) {
                self.next += 1;
                return Some(item);
            }
            match self.results.recv() {
                Ok((seq, item)) => {
                    self.pending.insert(seq, item);
                }
                Err(_) if self.pending.is_empty() => return None,
                // a worker died without reporting this item
                Err(_) => {
                    let seq = self.next;
                    self.next += 1;
                    return Some(Err(Error::Other(format!("item {} was lost by a map worker", seq))));
                }
            }
        }
    }
}

fn panic_error(seq: usize, panic: Box<dyn Any + Send>) -> Error {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    Error::Other(format!("map worker panicked on item {}: {}", seq, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::time::Duration;

    #[test]
    fn test_preserves_order() {
        let source: DataFlow<u64> = Box::new((0..50u64).map(Ok));
        let mapped = MultiThreadMapData::new(source, 4, 8, |x| {
            thread::sleep(Duration::from_millis((50 - x) % 7));
            Ok(x * 2)
        });
        let out: Vec<u64> = mapped.collect::<Result<_>>().unwrap();
        assert_eq!(out, (0..50u64).map(|x| x * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_errors_keep_position() {
        let source: DataFlow<u32> = Box::new((0..5u32).map(Ok));
        let mapped = MultiThreadMapData::new(source, 2, 2, |x| {
            if x == 2 {
                Err(Error::Other("bad".to_string()))
            } else {
                Ok(x)
            }
        });
        let out: Vec<Result<u32>> = mapped.collect();
        assert_eq!(out.len(), 5);
        assert!(out[2].is_err());
        assert!(matches!(out[4], Ok(4)));
    }

    #[test]
    fn test_panic_becomes_error() {
        let source: DataFlow<u32> = Box::new((0..6u32).map(Ok));
        let mapped = MultiThreadMapData::new(source, 2, 4, |x| {
            if x == 2 {
                panic!("backend crashed");
            }
            Ok(x)
        });
        let out: Vec<Result<u32>> = mapped.collect();
        assert_eq!(out.len(), 6);
        match &out[2] {
            Err(Error::Other(msg)) => assert!(msg.contains("backend crashed")),
            other => panic!("expected an error, got {other:?}"),
        }
        assert!(matches!(out[5], Ok(5)));
    }

    #[test]
    fn test_early_drop() {
        let source: DataFlow<u32> = Box::new((0..10_000u32).map(Ok));
        let mut mapped = MultiThreadMapData::new(source, 3, 4, Ok);
        assert!(matches!(mapped.next(), Some(Ok(0))));
        drop(mapped);
    }
}
