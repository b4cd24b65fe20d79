//! Fan-out/fan-in over independent blocks.
//!
//! Architecture:
//! - Main thread: queue every block index, then collect results
//! - Worker pool: run the block codec on its own input slice
//! - Join barrier: the crossbeam scope ends before any placement happens
//!
//! Workers only read their own input range and return owned buffers, so
//! nothing is shared mutably while they run.

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::{bounded, unbounded, Receiver, Sender};

use super::block::BlockDescriptor;
use crate::error::{Error, Result};

/// Result of processing a single block
struct BlockResult {
    /// Index of the block in input order
    index: usize,
    data: Result<Vec<u8>>,
}

/// Run `codec` over every input on up to `num_threads` workers
///
/// Outputs are returned in input order. If any block fails, workers stop
/// taking new blocks, every completed output is dropped, and the error of
/// the lowest-indexed block seen to fail is returned.
pub fn map_blocks<F>(inputs: &[&[u8]], num_threads: usize, codec: F) -> Result<Vec<Vec<u8>>>
where
    F: Fn(&[u8]) -> Result<Vec<u8>> + Sync,
{
    if num_threads <= 1 || inputs.len() <= 1 {
        return inputs
            .iter()
            .enumerate()
            .map(|(index, input)| run_block(index, input, &codec))
            .collect();
    }

    let workers = num_threads.min(inputs.len());

    // Jobs are just indices, so the whole queue is filled up front
    let (job_tx, job_rx): (Sender<usize>, Receiver<usize>) = unbounded();
    for index in 0..inputs.len() {
        job_tx.send(index).map_err(|_| Error::Internal("Job queue disconnected".to_string()))?;
    }
    drop(job_tx);

    let (result_tx, result_rx): (Sender<BlockResult>, Receiver<BlockResult>) = bounded(workers * 4);
    let abort = AtomicBool::new(false);

    let result = crossbeam::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let abort = &abort;
            let codec = &codec;

            scope.spawn(move |_| {
                worker_thread(inputs, job_rx, result_tx, abort, codec);
            });
        }

        // Drop our copy so the result channel closes when workers finish
        drop(result_tx);

        collect_results(inputs.len(), result_rx, &abort)
    });

    result.map_err(|_| Error::Internal("Thread panicked".to_string()))?
}

/// Worker thread function: processes blocks until the queue drains or an abort is signalled
fn worker_thread<F>(
    inputs: &[&[u8]],
    job_rx: Receiver<usize>,
    result_tx: Sender<BlockResult>,
    abort: &AtomicBool,
    codec: &F,
) where
    F: Fn(&[u8]) -> Result<Vec<u8>>,
{
    while let Ok(index) = job_rx.recv() {
        if abort.load(Ordering::Relaxed) {
            break;
        }

        let data = run_block(index, inputs[index], codec);
        if result_tx.send(BlockResult { index, data }).is_err() {
            // Main thread has stopped, exit
            break;
        }
    }
}

fn run_block<F>(index: usize, input: &[u8], codec: &F) -> Result<Vec<u8>>
where
    F: Fn(&[u8]) -> Result<Vec<u8>>,
{
    let output = codec(input)?;
    log::debug!("block {}: {} -> {} bytes", index, input.len(), output.len());
    Ok(output)
}

fn collect_results(
    count: usize,
    result_rx: Receiver<BlockResult>,
    abort: &AtomicBool,
) -> Result<Vec<Vec<u8>>> {
    let mut slots: Vec<Option<Vec<u8>>> = vec![None; count];
    let mut failure: Option<(usize, Error)> = None;

    for BlockResult { index, data } in result_rx.iter() {
        match data {
            Ok(output) => slots[index] = Some(output),
            Err(e) => {
                abort.store(true, Ordering::Relaxed);
                if failure.as_ref().map_or(true, |(failed, _)| index < *failed) {
                    failure = Some((index, e));
                }
            }
        }
    }

    if let Some((index, e)) = failure {
        log::warn!("block {} failed, discarding {} blocks: {}", index, count, e);
        return Err(e);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| Error::Internal(format!("block {index} produced no output")))
        })
        .collect()
}

/// Copy every placed block's data into `out` at its output offset
///
/// Destination ranges are disjoint, so the copies are spread over up to
/// `num_threads` workers without locking.
pub fn scatter(out: &mut [u8], blocks: &[BlockDescriptor], num_threads: usize) -> Result<()> {
    let mut pieces: Vec<(&mut [u8], &[u8])> = Vec::with_capacity(blocks.len());
    let mut rest: &mut [u8] = out;
    let mut cursor = 0;

    for block in blocks {
        let data = block
            .data
            .as_deref()
            .ok_or_else(|| Error::Internal("block was never processed".to_string()))?;
        if block.output_offset < cursor || block.output_offset + data.len() > cursor + rest.len() {
            let range = block.output_range();
            return Err(Error::Internal(format!("block output {range:?} out of order")));
        }

        let (_, tail) = std::mem::take(&mut rest).split_at_mut(block.output_offset - cursor);
        let (dst, tail) = tail.split_at_mut(data.len());
        pieces.push((dst, data));
        rest = tail;
        cursor = block.output_offset + data.len();
    }

    if num_threads <= 1 || pieces.len() <= 1 {
        for (dst, src) in pieces {
            dst.copy_from_slice(src);
        }
        return Ok(());
    }

    let per_worker = pieces.len().div_ceil(num_threads);
    crossbeam::scope(|scope| {
        for group in pieces.chunks_mut(per_worker) {
            scope.spawn(move |_| {
                for (dst, src) in group.iter_mut() {
                    dst.copy_from_slice(src);
                }
            });
        }
    })
    .map_err(|_| Error::Internal("Thread panicked".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::block::{place_outputs, split_blocks};

    fn reverse(input: &[u8]) -> Result<Vec<u8>> {
        Ok(input.iter().rev().copied().collect())
    }

    fn fail_on_zero(input: &[u8]) -> Result<Vec<u8>> {
        if input.first() == Some(&0) {
            return Err(Error::Corrupt("zero block"));
        }
        Ok(input.to_vec())
    }

    #[test]
    fn test_map_blocks_preserves_order() {
        let data: Vec<u8> = (0..100).collect();
        let inputs: Vec<&[u8]> = data.chunks(7).collect();
        for threads in [1, 2, 4, 16] {
            let outputs = map_blocks(&inputs, threads, reverse).unwrap();
            assert_eq!(outputs.len(), inputs.len());
            for (input, output) in inputs.iter().zip(&outputs) {
                let expected: Vec<u8> = input.iter().rev().copied().collect();
                assert_eq!(output, &expected);
            }
        }
    }

    #[test]
    fn test_map_blocks_failure_aborts() {
        let data = [1u8, 1, 1, 0, 1, 1, 0, 1];
        let inputs: Vec<&[u8]> = data.chunks(1).collect();
        for threads in [1, 3] {
            let err = map_blocks(&inputs, threads, fail_on_zero).unwrap_err();
            assert!(matches!(err, Error::Corrupt("zero block")));
        }
    }

    #[test]
    fn test_map_blocks_empty() {
        assert!(map_blocks(&[], 4, reverse).unwrap().is_empty());
    }

    #[test]
    fn test_scatter() {
        let mut blocks = split_blocks(30, 10);
        let end = place_outputs(&mut blocks, vec![vec![1; 4], vec![2; 6], vec![3; 2]], 3).unwrap();
        for threads in [1, 2, 8] {
            let mut out = vec![0u8; end];
            scatter(&mut out, &blocks, threads).unwrap();
            assert_eq!(out, [&[0u8; 3][..], &[1; 4], &[2; 6], &[3; 2]].concat());
        }
    }

    #[test]
    fn test_scatter_unprocessed_block() {
        let blocks = split_blocks(30, 10);
        let mut out = vec![0u8; 30];
        assert!(scatter(&mut out, &blocks, 1).is_err());
    }
}
