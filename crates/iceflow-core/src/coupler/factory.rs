//! Name-to-constructor registry assembling a component chain from an
//! ordered selection string: a model name followed by zero or more
//! modifier names, each modifier wrapping what came before it.

use crate::common::config::Config;
use crate::domain::{CoreResult, IceflowError};
use crate::grid::Grid;
use std::collections::BTreeMap;

type ModelConstructor<M> = Box<dyn Fn(&Grid, &Config) -> CoreResult<Box<M>>>;
type ModifierConstructor<M> = Box<dyn Fn(&Grid, &Config, Box<M>) -> CoreResult<Box<M>>>;

pub struct ComponentFactory<M: ?Sized> {
    /// Family name used in error messages ("interface", "ocean", ...).
    option: &'static str,
    default_model: Option<&'static str>,
    models: BTreeMap<&'static str, ModelConstructor<M>>,
    modifiers: BTreeMap<&'static str, ModifierConstructor<M>>,
}

impl<M: ?Sized> ComponentFactory<M> {
    pub fn new(option: &'static str) -> Self {
        Self {
            option,
            default_model: None,
            models: BTreeMap::new(),
            modifiers: BTreeMap::new(),
        }
    }

    pub fn add_model<F>(&mut self, name: &'static str, constructor: F)
    where
        F: Fn(&Grid, &Config) -> CoreResult<Box<M>> + 'static,
    {
        self.models.insert(name, Box::new(constructor));
    }

    pub fn add_modifier<F>(&mut self, name: &'static str, constructor: F)
    where
        F: Fn(&Grid, &Config, Box<M>) -> CoreResult<Box<M>> + 'static,
    {
        self.modifiers.insert(name, Box::new(constructor));
    }

    pub fn set_default(&mut self, name: &'static str) {
        self.default_model = Some(name);
    }

    /// Builds the chain described by `choices` ("model,modifier,...");
    /// an empty selection falls back to the default model. Construction
    /// either returns the complete chain or fails with a configuration
    /// error, leaving nothing partially built behind.
    pub fn create(&self, grid: &Grid, config: &Config, choices: &str) -> CoreResult<Box<M>> {
        let mut names = choices
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty());

        let model_name = match names.next() {
            Some(name) => name,
            None => self.default_model.ok_or_else(|| {
                IceflowError::configuration(format!(
                    "no {} model selected and no default is registered",
                    self.option
                ))
            })?,
        };

        let constructor = self.models.get(model_name).ok_or_else(|| {
            IceflowError::configuration(format!(
                "unknown {} model '{model_name}' (available: {})",
                self.option,
                self.known(&self.models)
            ))
        })?;
        let mut component = constructor(grid, config)?;

        for modifier_name in names {
            let constructor = self.modifiers.get(modifier_name).ok_or_else(|| {
                IceflowError::configuration(format!(
                    "unknown {} modifier '{modifier_name}' (available: {})",
                    self.option,
                    self.known(&self.modifiers)
                ))
            })?;
            component = constructor(grid, config, component)?;
        }

        Ok(component)
    }

    fn known<V>(&self, registry: &BTreeMap<&'static str, V>) -> String {
        let names: Vec<_> = registry.keys().copied().collect();
        if names.is_empty() {
            "none".to_string()
        } else {
            names.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ComponentFactory;
    use crate::common::config::Config;
    use crate::domain::ErrorCategory;
    use crate::grid::Grid;

    trait Named {
        fn describe(&self) -> String;
    }

    struct Base;

    impl Named for Base {
        fn describe(&self) -> String {
            "base".to_string()
        }
    }

    struct Wrapper {
        inner: Box<dyn Named>,
        tag: &'static str,
    }

    impl Named for Wrapper {
        fn describe(&self) -> String {
            format!("{}({})", self.tag, self.inner.describe())
        }
    }

    fn factory() -> ComponentFactory<dyn Named> {
        let mut factory = ComponentFactory::<dyn Named>::new("test");
        factory.add_model("base", |_, _| Ok(Box::new(Base)));
        factory.set_default("base");
        factory.add_modifier("wrap", |_, _, inner| {
            Ok(Box::new(Wrapper { inner, tag: "wrap" }))
        });
        factory.add_modifier("shift", |_, _, inner| {
            Ok(Box::new(Wrapper { inner, tag: "shift" }))
        });
        factory
    }

    fn grid() -> Grid {
        Grid::new(2, 2).expect("grid extents should be accepted")
    }

    #[test]
    fn modifiers_stack_in_selection_order() {
        let chain = factory()
            .create(&grid(), &Config::default(), "base,wrap,shift")
            .expect("chain should build");
        assert_eq!(chain.describe(), "shift(wrap(base))");
    }

    #[test]
    fn empty_selection_uses_the_default_model() {
        let chain = factory()
            .create(&grid(), &Config::default(), "")
            .expect("default chain should build");
        assert_eq!(chain.describe(), "base");
    }

    #[test]
    fn unknown_modifier_fails_with_a_configuration_error() {
        let error = factory()
            .create(&grid(), &Config::default(), "base,melt")
            .err()
            .expect("unknown modifier should fail");
        assert_eq!(error.category(), ErrorCategory::Configuration);
        assert!(error.to_string().contains("melt"));
        assert!(error.to_string().contains("shift, wrap"));
    }

    #[test]
    fn unknown_model_lists_the_registered_models() {
        let error = factory()
            .create(&grid(), &Config::default(), "planet")
            .err()
            .expect("unknown model should fail");
        assert_eq!(error.category(), ErrorCategory::Configuration);
        assert!(error.to_string().contains("available: base"));
    }
}
