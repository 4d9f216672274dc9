// Copyright 2018-2024 the Deno authors. All rights reserved. MIT license.

#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]

//! Named modules declared with their dependencies and a factory, resolved
//! lazily and asynchronously.
//!
//! A [`ModuleLoader`] owns the registered [`Definition`]s and the modules
//! instantiated from them. Requiring a module resolves its dependencies
//! first, fetching definitions that are not registered yet through a
//! [`source::Fetcher`], and instantiates every module at most once.

mod cache;
mod config;
mod definition;
mod error;
mod fetch;
mod join;
mod loader;
mod resolver;
mod rt;
pub mod source;

pub use cache::ModuleCache;
pub use config::ErrorSink;
pub use config::LoaderConfig;
pub use config::LoaderOptions;
pub use config::PanicErrorSink;
pub use definition::is_valid_module_name;
pub use definition::Definition;
pub use definition::DefinitionRegistry;
pub use definition::Factory;
pub use error::ArgumentError;
pub use error::CyclicDependencyError;
pub use error::DefinitionError;
pub use error::FetchError;
pub use error::RequireError;
pub use error::ResolveError;
pub use join::join_all;
pub use loader::ModuleLoader;
pub use resolver::LoadPath;
pub use resolver::ModuleOutcomes;
pub use resolver::ModulesOutcomes;
pub use rt::BoxedFuture;
pub use rt::DefaultExecutor;
pub use rt::Executor;
