// Copyright 2018-2024 the Deno authors. MIT license.

use futures::future;
use futures::stream;
use futures::stream::LocalBoxStream;
use futures::Stream;
use futures::StreamExt;

/// Runs `op` for every item concurrently and joins the branches back into a
/// single ordered outcome.
///
/// Each branch is a stream of outcomes. Every error any branch produces is
/// yielded on its own, as soon as it happens, so `k` failing branches
/// produce `k` errors and never a partial result. When every branch has
/// produced a value the values are yielded once, in the order of `items`.
/// An empty input yields an empty result immediately.
pub fn join_all<'a, I, R, E, S>(
  items: I,
  op: impl FnMut(I::Item) -> S,
) -> LocalBoxStream<'a, Result<Vec<R>, E>>
where
  I: IntoIterator,
  S: Stream<Item = Result<R, E>> + 'a,
  R: 'a,
  E: 'a,
{
  let branches = items
    .into_iter()
    .map(op)
    .enumerate()
    .map(|(index, branch)| {
      branch.map(move |result| (index, result)).boxed_local()
    })
    .collect::<Vec<_>>();
  if branches.is_empty() {
    return stream::once(future::ready(Ok(Vec::new()))).boxed_local();
  }

  let mut slots = Vec::with_capacity(branches.len());
  slots.resize_with(branches.len(), || None);
  let mut unsettled = branches.len();
  stream::select_all(branches)
    .filter_map(move |(index, result)| {
      let output = match result {
        Err(err) => Some(Err(err)),
        // already joined
        Ok(_) if unsettled == 0 => None,
        Ok(value) => {
          let slot = &mut slots[index];
          if slot.is_none() {
            *slot = Some(value);
            unsettled -= 1;
          }
          if unsettled == 0 {
            Some(Ok(slots.iter_mut().filter_map(Option::take).collect()))
          } else {
            None
          }
        }
      };
      future::ready(output)
    })
    .boxed_local()
}
