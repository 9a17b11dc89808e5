//! Active objects: named bags of timed attributes with a spawn lifecycle
//!
//! Attribute timers run only while the owner is active. Deactivating stops
//! every timer before resetting the attributes, so nothing scheduled before
//! `deactivate()` can land afterwards.

use ahash::AHashMap;

use crate::core::error::{validate_name, Result, SkirmishError};
use crate::entity::attribute::{AttributeSpec, AttributeValue, TimedAttribute};
use crate::entity::listeners::{ListenerId, Listeners};

/// Called with the object's name on activation or deactivation
pub type LifecycleListener = dyn FnMut(&str) + Send;

#[derive(Debug)]
pub struct ActiveObject {
    name: String,
    attributes: AHashMap<String, TimedAttribute>,
    active: bool,
    on_activate: Listeners<LifecycleListener>,
    on_deactivate: Listeners<LifecycleListener>,
}

impl ActiveObject {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;

        Ok(Self {
            name,
            attributes: AHashMap::new(),
            active: false,
            on_activate: Listeners::new(),
            on_deactivate: Listeners::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn activate(&mut self) {
        if self.active {
            return;
        }
        self.active = true;

        for attribute in self.attributes.values_mut() {
            attribute.start();
        }
        for listener in self.on_activate.iter_mut() {
            listener(self.name.as_str());
        }
    }

    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;

        for attribute in self.attributes.values_mut() {
            attribute.stop();
            attribute.reset();
        }
        for listener in self.on_deactivate.iter_mut() {
            listener(self.name.as_str());
        }
    }

    /// Create or replace an attribute from a spec.
    pub fn add_attribute(&mut self, spec: AttributeSpec) -> Result<()> {
        let attribute = TimedAttribute::new(spec)?;
        self.insert_attribute(attribute);
        Ok(())
    }

    /// Insert a built attribute, replacing any attribute with the same name.
    /// The old attribute's timer is stopped first; the new one starts if the
    /// object is active.
    pub fn insert_attribute(&mut self, mut attribute: TimedAttribute) {
        if let Some(mut previous) = self.attributes.remove(attribute.name()) {
            previous.stop();
        }
        if self.active {
            attribute.start();
        }
        self.attributes
            .insert(attribute.name().to_string(), attribute);
    }

    pub fn attribute(&self, name: &str) -> Option<&TimedAttribute> {
        self.attributes.get(name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut TimedAttribute> {
        self.attributes.get_mut(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &TimedAttribute> + '_ {
        self.attributes.values()
    }

    pub fn attribute_value(&self, name: &str) -> Option<AttributeValue> {
        self.attributes.get(name).map(TimedAttribute::value)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.attribute_value(name).and_then(|value| value.as_number())
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.attribute_value(name).and_then(|value| value.as_bool())
    }

    /// Set an attribute's value, creating a fixed attribute if it is missing.
    pub fn set_attribute_value(
        &mut self,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<()> {
        match self.attributes.get_mut(name) {
            Some(attribute) => attribute.set_value(value),
            None => self.add_attribute(AttributeSpec::fixed(name, value)),
        }
    }

    /// Like `attribute_mut`, but a missing attribute is an error.
    pub fn require_attribute_mut(&mut self, name: &str) -> Result<&mut TimedAttribute> {
        let owner = &self.name;
        self.attributes
            .get_mut(name)
            .ok_or_else(|| SkirmishError::UnknownAttribute {
                owner: owner.clone(),
                attribute: name.to_string(),
            })
    }

    pub fn add_activate_listener(
        &mut self,
        listener: impl FnMut(&str) + Send + 'static,
    ) -> ListenerId {
        self.on_activate.add(Box::new(listener))
    }

    pub fn remove_activate_listener(&mut self, id: ListenerId) -> bool {
        self.on_activate.remove(id)
    }

    pub fn add_deactivate_listener(
        &mut self,
        listener: impl FnMut(&str) + Send + 'static,
    ) -> ListenerId {
        self.on_deactivate.add(Box::new(listener))
    }

    pub fn remove_deactivate_listener(&mut self, id: ListenerId) -> bool {
        self.on_deactivate.remove(id)
    }
}
