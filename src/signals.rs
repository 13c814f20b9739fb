//! Lifecycle signals fired around composition.
//!
//! The bus is an explicit dispatcher owned by one Director; listeners are
//! held as an ordered list of boxed [`Extension`] trait objects, so two
//! Directors in the same process never share state. Delivery is
//! synchronous and in subscription order, and the first listener error
//! stops delivery and aborts the run — subscription order is part of the
//! observable contract, not an implementation detail.

use crate::composers::Composers;
use crate::config::Configuration;
use crate::error::Result;
use crate::frontmatter::Frontmatter;
use crate::resolver::FileResolver;
use crate::template::TemplateCatalog;
use std::path::Path;

/// What a listener may see of the build while handling a signal. Replaces
/// the "cache the resolver during pre-composition" pattern: the view is
/// handed to every handler instead.
pub struct SiteView<'a> {
    pub config: &'a Configuration,
    pub composers: &'a Composers,
    pub catalog: &'a TemplateCatalog,
    pub site_path: &'a Path,
    pub outdir: &'a Path,
}

impl SiteView<'_> {
    /// Resolver for mapping source paths to routes and URLs.
    pub fn resolver(&self) -> FileResolver<'_> {
        FileResolver::new(self.site_path, self.composers, &self.config.site.domain)
    }
}

/// An observer of the build lifecycle. Implement only the signals the
/// extension handles; the defaults are no-ops.
pub trait Extension {
    /// Fired once per build or incremental event, before any file work.
    fn on_pre_composition(&mut self, view: &SiteView<'_>) -> Result<()> {
        let _ = view;
        Ok(())
    }

    /// Fired while a stale file is being composed, after its frontmatter
    /// is parsed and before the composer consumes it. The frontmatter is
    /// mutated in place; later listeners see earlier listeners' writes.
    fn on_frontmatter_loaded(
        &mut self,
        source_file: &Path,
        frontmatter: &mut Frontmatter,
        view: &SiteView<'_>,
    ) -> Result<()> {
        let _ = (source_file, frontmatter, view);
        Ok(())
    }

    /// Fired once per build or incremental event, after all file work.
    fn on_post_composition(&mut self, view: &SiteView<'_>) -> Result<()> {
        let _ = view;
        Ok(())
    }
}

/// Ordered broadcast of the three lifecycle signals.
#[derive(Default)]
pub struct SignalBus {
    listeners: Vec<Box<dyn Extension>>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener at the end of the delivery order.
    pub fn subscribe(&mut self, listener: Box<dyn Extension>) {
        self.listeners.push(listener);
    }

    pub fn fire_pre_composition(&mut self, view: &SiteView<'_>) -> Result<()> {
        for listener in &mut self.listeners {
            listener.on_pre_composition(view)?;
        }
        Ok(())
    }

    pub fn fire_frontmatter_loaded(
        &mut self,
        source_file: &Path,
        frontmatter: &mut Frontmatter,
        view: &SiteView<'_>,
    ) -> Result<()> {
        for listener in &mut self.listeners {
            listener.on_frontmatter_loaded(source_file, frontmatter, view)?;
        }
        Ok(())
    }

    pub fn fire_post_composition(&mut self, view: &SiteView<'_>) -> Result<()> {
        for listener in &mut self.listeners {
            listener.on_post_composition(view)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AbortError;
    use crate::test_support::compose_context;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Appends a marker key, recording what it observed first.
    struct Recorder {
        name: &'static str,
        seen: Rc<RefCell<Vec<String>>>,
    }

    impl Extension for Recorder {
        fn on_frontmatter_loaded(
            &mut self,
            _source_file: &Path,
            frontmatter: &mut Frontmatter,
            _view: &SiteView<'_>,
        ) -> Result<()> {
            let keys: Vec<_> = frontmatter.keys().cloned().collect();
            self.seen.borrow_mut().push(format!("{}:{}", self.name, keys.join(",")));
            frontmatter.insert(self.name.into(), true.into());
            Ok(())
        }
    }

    struct Failing;

    impl Extension for Failing {
        fn on_frontmatter_loaded(
            &mut self,
            _source_file: &Path,
            _frontmatter: &mut Frontmatter,
            _view: &SiteView<'_>,
        ) -> Result<()> {
            Err(AbortError::msg("listener failure"))
        }
    }

    #[test]
    fn test_mutations_visible_to_later_listeners() {
        let fixture = compose_context();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = SignalBus::new();
        bus.subscribe(Box::new(Recorder {
            name: "first",
            seen: Rc::clone(&seen),
        }));
        bus.subscribe(Box::new(Recorder {
            name: "second",
            seen: Rc::clone(&seen),
        }));

        let mut frontmatter = Frontmatter::new();
        fixture.with_view(|view| {
            bus.fire_frontmatter_loaded(Path::new("a.md"), &mut frontmatter, view)
        })
        .unwrap();

        // The first listener saw an empty mapping; the second saw the
        // first listener's write.
        assert_eq!(&*seen.borrow(), &["first:", "second:first"]);
        assert!(frontmatter.contains_key("first"));
        assert!(frontmatter.contains_key("second"));
    }

    #[test]
    fn test_first_error_stops_delivery() {
        let fixture = compose_context();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = SignalBus::new();
        bus.subscribe(Box::new(Failing));
        bus.subscribe(Box::new(Recorder {
            name: "late",
            seen: Rc::clone(&seen),
        }));

        let mut frontmatter = Frontmatter::new();
        let err = fixture
            .with_view(|view| {
                bus.fire_frontmatter_loaded(Path::new("a.md"), &mut frontmatter, view)
            })
            .unwrap_err();
        assert!(format!("{err}").contains("listener failure"));
        assert!(seen.borrow().is_empty());
    }
}
