// Copyright 2018-2024 the Deno authors. MIT license.

use futures::channel::oneshot;
use futures::FutureExt;
use std::future::Future;
use std::pin::Pin;
use std::task::Context;
use std::task::Poll;

pub type BoxedFuture = Pin<Box<dyn Future<Output = ()> + 'static>>;

/// An executor for futures.
///
/// This trait allows the loader to run fetches and detached `require`
/// resolutions in the background. The returned future completes when the
/// spawned one does; an executor that cannot spawn may return `fut` itself.
pub trait Executor {
  /// Spawns a future to run on this executor.
  fn execute(&self, fut: BoxedFuture) -> BoxedFuture;
}

/// Spawns onto the current-thread tokio runtime when one is running.
/// Otherwise, and always on wasm32, the future is handed back to be driven
/// by whoever polls the returned future.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultExecutor;

impl Executor for DefaultExecutor {
  fn execute(&self, fut: BoxedFuture) -> BoxedFuture {
    #[cfg(not(target_arch = "wasm32"))]
    let fut = match tokio::runtime::Handle::try_current() {
      Ok(_) => spawn_on_runtime(fut),
      Err(_) => fut,
    };
    fut
  }
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_on_runtime(fut: BoxedFuture) -> BoxedFuture {
  deno_unsync::spawn(fut)
    .map(|result| {
      if let Err(err) = result {
        if let Ok(panic) = err.try_into_panic() {
          std::panic::resume_unwind(panic);
        }
      }
    })
    .boxed_local()
}

/// Output of a future spawned with [`spawn`]. The task keeps running when
/// this is dropped; awaiting it drives the executor's handle and then reads
/// the output the task sent back.
pub(crate) struct JoinHandle<T> {
  output: oneshot::Receiver<T>,
  task: BoxedFuture,
}

impl<T> Future for JoinHandle<T> {
  type Output = T;

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
    if self.task.as_mut().poll(cx).is_pending() {
      return Poll::Pending;
    }
    match self.output.try_recv() {
      Ok(Some(output)) => Poll::Ready(output),
      // the task finished without sending, so its future panicked
      _ => panic!("spawned task did not produce an output"),
    }
  }
}

/// Runs `fut` on `executor`. Used by the fetch coalescer so a fetch keeps
/// going after every waiter has gone away.
pub(crate) fn spawn<F, T: 'static>(
  executor: &dyn Executor,
  fut: F,
) -> JoinHandle<T>
where
  F: Future<Output = T> + 'static,
{
  let (tx, output) = oneshot::channel();
  let task = executor.execute(Box::pin(async move {
    tx.send(fut.await).ok();
  }));
  JoinHandle { output, task }
}
