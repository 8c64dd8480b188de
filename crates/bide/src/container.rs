// Dependency container - capability wiring with cycle detection
//
// A capability is any `'static` type, usually a trait object like
// `dyn Driver`. Each capability gets one factory, registered before first
// use; `instance()` runs factories lazily, caches singletons for the
// container's lifetime, and rejects cyclic factory graphs with the full
// resolution path instead of recursing into a stack overflow.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};

type BoxedInstance = Box<dyn Any + Send + Sync>;
type Factory = Arc<dyn Fn(&Container) -> Result<BoxedInstance> + Send + Sync>;

struct Binding {
    implementation: &'static str,
    factory: Factory,
}

#[derive(Clone, Copy)]
struct ChainEntry {
    capability: TypeId,
    name: &'static str,
}

/// Resolves and caches singleton instances of collaborator capabilities.
///
/// ```ignore
/// use bide::{Config, Container, Driver, Session};
///
/// let container = Container::new();
/// container.bind::<dyn Driver, WebDriverClient, _>(|_| {
///     Ok(Arc::new(WebDriverClient::connect("http://localhost:4444")?))
/// })?;
/// container.bind::<Config, Config, _>(|_| Ok(Arc::new(Config::default())))?;
/// let session = Session::from_container(&container)?;
/// ```
#[derive(Default)]
pub struct Container {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    bindings: HashMap<TypeId, Binding>,
    cache: HashMap<TypeId, BoxedInstance>,
    chain: Vec<ChainEntry>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the factory producing capability `C`, implemented by `I`.
    ///
    /// `I` is only used for diagnostics (cycle paths name the concrete
    /// implementation). Binding is a one-time configuration step: rebinding
    /// a capability errors with the first binding left in effect, and a
    /// capability that was already resolved can no longer be bound.
    pub fn bind<C, I, F>(&self, factory: F) -> Result<()>
    where
        C: ?Sized + Any + Send + Sync,
        I: Any,
        F: Fn(&Container) -> Result<Arc<C>> + Send + Sync + 'static,
    {
        let key = TypeId::of::<C>();
        let capability = short_type_name::<C>();
        let mut state = self.state.lock();
        if state.cache.contains_key(&key) {
            return Err(Error::BoundAfterResolution { capability });
        }
        if state.bindings.contains_key(&key) {
            return Err(Error::AlreadyBound { capability });
        }
        let factory: Factory =
            Arc::new(move |container| factory(container).map(|arc| Box::new(arc) as BoxedInstance));
        state.bindings.insert(
            key,
            Binding {
                implementation: short_type_name::<I>(),
                factory,
            },
        );
        tracing::debug!(capability, "registered binding");
        Ok(())
    }

    /// Returns the singleton for capability `C`, constructing it on first use.
    ///
    /// Factories may call `instance()` for their own dependencies; a cycle in
    /// that graph fails immediately with the full resolution path.
    pub fn instance<C>(&self) -> Result<Arc<C>>
    where
        C: ?Sized + Any,
    {
        let key = TypeId::of::<C>();
        let capability = short_type_name::<C>();

        let factory = {
            let mut state = self.state.lock();
            if let Some(cached) = state.cache.get(&key) {
                return match cached.downcast_ref::<Arc<C>>() {
                    Some(instance) => Ok(Arc::clone(instance)),
                    None => Err(Error::CorruptedCache { capability }),
                };
            }
            if let Some(position) = state.chain.iter().position(|entry| entry.capability == key) {
                let implementation = state
                    .bindings
                    .get(&key)
                    .map(|binding| binding.implementation)
                    .unwrap_or(capability);
                let mut path = vec![implementation];
                path.extend(state.chain[position + 1..].iter().map(|entry| entry.name));
                path.push(implementation);
                return Err(Error::CyclicDependency {
                    path: path.join(" -> "),
                });
            }
            let Some(binding) = state.bindings.get(&key) else {
                return Err(Error::NoBinding { capability });
            };
            let factory = Arc::clone(&binding.factory);
            state.chain.push(ChainEntry {
                capability: key,
                name: capability,
            });
            factory
        };

        tracing::debug!(capability, "resolving capability");
        // The lock is released while the factory runs so it can resolve its
        // own dependencies through this container.
        let produced = factory(self);

        let mut state = self.state.lock();
        state.chain.pop();
        let instance = produced?;
        let arc = match instance.downcast_ref::<Arc<C>>() {
            Some(arc) => Arc::clone(arc),
            None => return Err(Error::CorruptedCache { capability }),
        };
        state.cache.insert(key, instance);
        Ok(arc)
    }
}

/// Last path segment of a type name, without any `dyn ` prefix.
fn short_type_name<T: ?Sized>() -> &'static str {
    let name = std::any::type_name::<T>();
    let last = name.rsplit("::").next().unwrap_or(name);
    last.strip_prefix("dyn ").unwrap_or(last)
}
