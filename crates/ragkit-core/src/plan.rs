//! Deferred effect plans.
//!
//! A [`Plan`] describes an effectful computation without running it. Plans
//! are composed with [`Plan::map`] and [`Plan::and_then`] and executed exactly
//! once by [`perform`], which consumes the plan. Nothing runs at construction
//! time.

use std::fmt;

use crate::error::{Error, Result};

type Thunk<'a, T> = Box<dyn FnOnce() -> anyhow::Result<T> + 'a>;

/// A not-yet-executed computation yielding `T`.
pub enum Plan<'a, T> {
    /// A value that needs no effect.
    Pure(T),
    /// A zero-argument effect, run at interpretation time.
    Delayed(Thunk<'a, T>),
    /// A plan whose eventual value is transformed by a function.
    Mapped(Box<dyn Step<'a, T> + 'a>),
    /// A plan whose eventual value selects the next plan.
    Bound(Box<dyn Step<'a, T> + 'a>),
}

/// One erased composition step; `U` is hidden behind the trait object.
pub trait Step<'a, T> {
    fn run(self: Box<Self>) -> anyhow::Result<T>;
}

struct MapStep<'a, U, T> {
    plan: Plan<'a, U>,
    f: Box<dyn FnOnce(U) -> T + 'a>,
}

impl<'a, U: 'a, T> Step<'a, T> for MapStep<'a, U, T> {
    fn run(self: Box<Self>) -> anyhow::Result<T> {
        let MapStep { plan, f } = *self;
        plan.run().map(f)
    }
}

struct BindStep<'a, U, T> {
    plan: Plan<'a, U>,
    f: Box<dyn FnOnce(U) -> Plan<'a, T> + 'a>,
}

impl<'a, U: 'a, T: 'a> Step<'a, T> for BindStep<'a, U, T> {
    fn run(self: Box<Self>) -> anyhow::Result<T> {
        let BindStep { plan, f } = *self;
        f(plan.run()?).run()
    }
}

impl<'a, T: 'a> Plan<'a, T> {
    pub fn pure(value: T) -> Self { Self::Pure(value) }

    pub fn map<U: 'a>(self, f: impl FnOnce(T) -> U + 'a) -> Plan<'a, U> {
        Plan::Mapped(Box::new(MapStep { plan: self, f: Box::new(f) }))
    }

    pub fn and_then<U: 'a>(self, f: impl FnOnce(T) -> Plan<'a, U> + 'a) -> Plan<'a, U> {
        Plan::Bound(Box::new(BindStep { plan: self, f: Box::new(f) }))
    }

    fn run(self) -> anyhow::Result<T> {
        match self {
            Self::Pure(value) => Ok(value),
            Self::Delayed(thunk) => thunk(),
            Self::Mapped(step) | Self::Bound(step) => step.run(),
        }
    }
}

impl<T> fmt::Debug for Plan<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Pure(_) => "Pure",
            Self::Delayed(_) => "Delayed",
            Self::Mapped(_) => "Mapped",
            Self::Bound(_) => "Bound",
        };
        write!(f, "Plan::{tag}(..)")
    }
}

/// Wrap an effect without running it.
pub fn delay<'a, T>(thunk: impl FnOnce() -> anyhow::Result<T> + 'a) -> Plan<'a, T> { Plan::Delayed(Box::new(thunk)) }

/// Free-function form of [`Plan::map`].
pub fn map<'a, T: 'a, U: 'a>(plan: Plan<'a, T>, f: impl FnOnce(T) -> U + 'a) -> Plan<'a, U> { plan.map(f) }

/// Run a plan once.
///
/// Adapter faults surface as [`Error::Io`] (or [`Error::NotFound`] for a
/// missing path); faults that already are an [`Error`] pass through.
pub fn perform<'a, T: 'a>(plan: Plan<'a, T>) -> Result<T> { plan.run().map_err(Error::from_fault) }
