//! Temporal adaptation factory with per-adaptee caching

use super::AdaptedOutputFactory;
use crate::adapt::TimeAdaptor;
use crate::error::{ExchangeError, ExchangeResult};
use crate::identity::{Describable, Identifier};
use crate::port::{AdaptedOutputRef, InputRef, OutputRef};
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

struct CacheEntry {
    method_id: String,
    adaptee_id: String,
    adaptor: Rc<TimeAdaptor>,
}

/// Factory for [`TimeAdaptor`] instances
///
/// Discovery lazily builds one adaptor per `(method id, adaptee id)` pair
/// and caches it, so repeated creation hands back the identical instance.
/// Creation refuses ids that never went through discovery here, which
/// keeps ids from one factory from leaking into another.
pub struct TimeAdaptedOutputFactory {
    id: String,
    caption: RefCell<String>,
    description: RefCell<String>,
    cache: RefCell<Vec<CacheEntry>>,
}

impl TimeAdaptedOutputFactory {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            caption: RefCell::new(id.clone()),
            id,
            description: RefCell::new(String::new()),
            cache: RefCell::new(Vec::new()),
        }
    }

    fn cached(&self, method_id: &str, adaptee_id: &str) -> Option<Rc<TimeAdaptor>> {
        self.cache
            .borrow()
            .iter()
            .find(|e| e.method_id == method_id && e.adaptee_id == adaptee_id)
            .map(|e| e.adaptor.clone())
    }
}

impl Default for TimeAdaptedOutputFactory {
    fn default() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }
}

impl Describable for TimeAdaptedOutputFactory {
    fn id(&self) -> &str {
        &self.id
    }

    fn caption(&self) -> String {
        self.caption.borrow().clone()
    }

    fn set_caption(&self, caption: &str) {
        *self.caption.borrow_mut() = caption.to_owned();
    }

    fn description(&self) -> String {
        self.description.borrow().clone()
    }

    fn set_description(&self, description: &str) {
        *self.description.borrow_mut() = description.to_owned();
    }
}

impl AdaptedOutputFactory for TimeAdaptedOutputFactory {
    /// One buffering adaptor per adaptee, discovered under the adaptee's id
    fn available_adapted_output_ids(
        &self,
        adaptee: &OutputRef,
        _target: Option<&InputRef>,
    ) -> Vec<Identifier> {
        let method_id = adaptee.id().to_owned();
        if self.cached(&method_id, adaptee.id()).is_none() {
            let adaptor = match TimeAdaptor::new(format!("{}.time", adaptee.id()), adaptee) {
                Ok(adaptor) => adaptor,
                Err(error) => {
                    tracing::warn!(adaptee = adaptee.id(), %error, "time adaptor not applicable");
                    return Vec::new();
                }
            };
            self.cache.borrow_mut().push(CacheEntry {
                method_id: method_id.clone(),
                adaptee_id: adaptee.id().to_owned(),
                adaptor,
            });
        }
        vec![Identifier::new(method_id)
            .with_description("buffers and resamples the output over time")]
    }

    fn create_adapted_output(
        &self,
        adapted_output_id: &str,
        adaptee: &OutputRef,
        _target: Option<&InputRef>,
    ) -> ExchangeResult<AdaptedOutputRef> {
        let adaptor = self
            .cached(adapted_output_id, adaptee.id())
            .ok_or_else(|| ExchangeError::UnknownAdaptorId(adapted_output_id.to_owned()))?;
        let adaptor: AdaptedOutputRef = adaptor;
        adaptee.add_adapted_output(adaptor.clone())?;
        Ok(adaptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{ExchangeItem, OutputPort};
    use crate::quantity::{Dimension, Quantity, Unit, ValueDefinition};
    use crate::temporal::TimeSet;
    use crate::values::ValueSet;

    fn source_output(id: &str) -> OutputRef {
        let definition = ValueDefinition::Quantity(Quantity::new(
            Unit::new(Dimension::volume_per_time(), "m^3/s"),
            "flow",
        ));
        let port = OutputPort::new(id);
        port.set_value_definition(definition.clone());
        port.set_time_set(TimeSet::from_timestamps(&[0.0]));
        port.set_values(ValueSet::new(definition, vec![vec![1.0]]));
        port
    }

    #[test]
    fn test_discovery_then_creation_returns_cached_instance() {
        let factory = TimeAdaptedOutputFactory::default();
        let adaptee = source_output("flow");
        let ids = factory.available_adapted_output_ids(&adaptee, None);
        assert_eq!(ids.len(), 1);

        let first = factory
            .create_adapted_output(&ids[0].id, &adaptee, None)
            .unwrap();
        let second = factory
            .create_adapted_output(&ids[0].id, &adaptee, None)
            .unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(adaptee.adapted_outputs().len(), 1);
    }

    #[test]
    fn test_undiscovered_id_is_refused() {
        let factory = TimeAdaptedOutputFactory::default();
        let adaptee = source_output("flow");
        assert!(matches!(
            factory.create_adapted_output("flow", &adaptee, None),
            Err(ExchangeError::UnknownAdaptorId(_))
        ));
        assert!(adaptee.adapted_outputs().is_empty());
    }

    #[test]
    fn test_distinct_adaptees_get_distinct_adaptors() {
        let factory = TimeAdaptedOutputFactory::default();
        let a = source_output("a");
        let b = source_output("b");
        let id_a = factory.available_adapted_output_ids(&a, None)[0].id.clone();
        let id_b = factory.available_adapted_output_ids(&b, None)[0].id.clone();
        let adaptor_a = factory.create_adapted_output(&id_a, &a, None).unwrap();
        let adaptor_b = factory.create_adapted_output(&id_b, &b, None).unwrap();
        assert!(!Rc::ptr_eq(&adaptor_a, &adaptor_b));
    }
}
