//! Job/result queue worker pool used to evaluate hypothesis sets across
//! several threads.

use crossbeam::channel::unbounded;
use crossbeam::thread;

use anyhow::Result;

/// Runs `work` over every item in `jobs` using `numproc` worker threads and
/// collects the `Some(_)` results, in no particular order (the caller is
/// expected to sort results afterwards — see [`crate::output`]).
pub fn run_jobs<T, R>(jobs: Vec<T>, numproc: usize, work: impl Fn(&T) -> Result<Option<R>> + Sync) -> Result<Vec<R>>
where
    T: Send,
    R: Send,
{
    let (job_tx, job_rx) = unbounded::<T>();
    let (res_tx, res_rx) = unbounded::<Result<Option<R>>>();

    for job in jobs {
        job_tx.send(job).expect("job queue receiver dropped prematurely");
    }
    drop(job_tx);

    thread::scope(|scope| {
        for _ in 0..numproc.max(1) {
            let job_rx = job_rx.clone();
            let res_tx = res_tx.clone();
            let work = &work;
            scope.spawn(move |_| {
                for job in job_rx.iter() {
                    if res_tx.send(work(&job)).is_err() {
                        break;
                    }
                }
            });
        }
    })
    .map_err(|_| anyhow::anyhow!("a worker thread panicked"))?;

    drop(res_tx);

    let mut results = Vec::new();
    for res in res_rx.iter() {
        if let Some(r) = res? {
            results.push(r);
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_results_from_every_job() {
        let jobs: Vec<i32> = (0..20).collect();
        let results = run_jobs(jobs, 4, |n| Ok(Some(n * 2))).unwrap();
        let sum: i32 = results.iter().sum();
        assert_eq!(sum, (0..20).map(|n| n * 2).sum::<i32>());
        assert_eq!(results.len(), 20);
    }

    #[test]
    fn drops_none_results() {
        let jobs: Vec<i32> = (0..10).collect();
        let results = run_jobs(jobs, 2, |n| Ok(if n % 2 == 0 { Some(*n) } else { None })).unwrap();
        assert_eq!(results.len(), 5);
    }
}
