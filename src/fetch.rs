// Copyright 2018-2024 the Deno authors. MIT license.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use deno_unsync::future::LocalFutureExt;
use deno_unsync::future::SharedLocal;
use futures::future::LocalBoxFuture;

use crate::rt::spawn;
use crate::rt::JoinHandle;
use crate::Executor;

pub(crate) type PendingFetch<V> = SharedLocal<JoinHandle<V>>;

/// Keeps at most one fetch in flight per key and hands its outcome to
/// every waiter.
///
/// Nothing is remembered once a fetch settles, so a later request for the
/// same key starts a new fetch.
pub(crate) struct FetchCoalescer<K, V: Clone> {
  pending: Rc<RefCell<HashMap<K, PendingFetch<V>>>>,
}

impl<K, V: Clone> Default for FetchCoalescer<K, V> {
  fn default() -> Self {
    Self {
      pending: Default::default(),
    }
  }
}

impl<K, V> FetchCoalescer<K, V>
where
  K: Hash + Eq + Clone + 'static,
  V: Clone + 'static,
{
  /// Joins the fetch in flight for `key`, or spawns the future returned by
  /// `start` on the executor when there is none.
  pub fn fetch(
    &self,
    key: &K,
    executor: &dyn Executor,
    start: impl FnOnce() -> LocalBoxFuture<'static, V>,
  ) -> PendingFetch<V> {
    if let Some(pending) = self.pending.borrow().get(key) {
      return pending.clone(); // already in flight
    }

    let fut = start();
    let pending = self.pending.clone();
    let settled_key = key.clone();
    let handle = spawn(executor, async move {
      let output = fut.await;
      pending.borrow_mut().remove(&settled_key);
      output
    });
    let shared = handle.shared_local();
    self.pending.borrow_mut().insert(key.clone(), shared.clone());
    shared
  }

  pub fn is_pending(&self, key: &K) -> bool {
    self.pending.borrow().contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.pending.borrow().len()
  }
}
