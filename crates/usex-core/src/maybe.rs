use std::rc::Rc;

use crate::{ReadSignal, Signal};

/// A plain value, a signal, or a getter; resolved on each [`MaybeSignal::get`].
pub enum MaybeSignal<T> {
    Value(T),
    Signal(ReadSignal<T>),
    Getter(Rc<dyn Fn() -> T>),
}

impl<T: Clone + 'static> MaybeSignal<T> {
    pub fn get(&self) -> T {
        match self {
            MaybeSignal::Value(v) => v.clone(),
            MaybeSignal::Signal(s) => s.get(),
            MaybeSignal::Getter(f) => f(),
        }
    }

    pub fn getter(f: impl Fn() -> T + 'static) -> Self {
        MaybeSignal::Getter(Rc::new(f))
    }
}

impl<T> Clone for MaybeSignal<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        match self {
            MaybeSignal::Value(v) => MaybeSignal::Value(v.clone()),
            MaybeSignal::Signal(s) => MaybeSignal::Signal(s.clone()),
            MaybeSignal::Getter(f) => MaybeSignal::Getter(f.clone()),
        }
    }
}

impl<T> From<T> for MaybeSignal<T> {
    fn from(v: T) -> Self {
        MaybeSignal::Value(v)
    }
}

impl<T: 'static> From<Signal<T>> for MaybeSignal<T> {
    fn from(s: Signal<T>) -> Self {
        MaybeSignal::Signal(s.read_only())
    }
}

impl<T> From<ReadSignal<T>> for MaybeSignal<T> {
    fn from(s: ReadSignal<T>) -> Self {
        MaybeSignal::Signal(s)
    }
}
