//! Type reflection for registration and invocation targets.
//!
//! The container never inspects closures itself. Everything it needs to know
//! about a target (is it callable, which types does it take, which type does it
//! produce) comes from the traits in this module, which are implemented for
//! plain functions and closures of up to ten parameters and for the
//! [`Constant`] wrapper.
//!
//! Parameters are declared through [`Inject`]: `Arc<T>` for any registered
//! `T` (including `dyn Trait` interfaces) and [`Container`](crate::Container)
//! for the container itself.

use std::any::{type_name, Any};
use std::error::Error;
use std::slice;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;

// Type-erased Arc for storage. Every stored value is an `Arc<T>` boxed once
// more so that unsized `T` can be recovered with a plain downcast.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type FactoryFn = Arc<dyn Fn(&[AnyArc]) -> DiResult<AnyArc> + Send + Sync>;

/// Whether a target's own type is usable as a lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// A value or trait-object type that consumers ask for directly.
    Value,
    /// A pointer-like wrapper (`Box`, `Arc`, `Rc`, references, raw pointers,
    /// `Pin`). Nobody depends on `Arc<Box<T>>`, so such targets must be
    /// registered under at least one interface.
    Indirect,
}

/// What the reflector reports about a registration target.
#[derive(Debug, Clone)]
pub struct Classification {
    /// Identity of the produced (or held) type.
    pub own: Key,
    /// Lookup usability of `own`.
    pub kind: TargetKind,
    /// Parameter identities for factories, `None` for constants.
    pub parameters: Option<Vec<Key>>,
}

impl Classification {
    pub(crate) fn factory<R: 'static>(parameters: Vec<Key>) -> DiResult<Self> {
        let name = type_name::<R>();
        // `()` and tuples are the zero- and multi-value shapes
        if name.starts_with('(') {
            return Err(DiError::InvalidConstructorShape(name));
        }
        Ok(Self {
            own: Key::of::<R>(),
            kind: kind_of(name),
            parameters: Some(parameters),
        })
    }

    pub(crate) fn constant<T: ?Sized + 'static>() -> Self {
        Self {
            own: Key::of::<T>(),
            kind: kind_of(type_name::<T>()),
            parameters: None,
        }
    }

    /// True when the target is re-invoked to build instances.
    pub fn is_factory(&self) -> bool {
        self.parameters.is_some()
    }
}

const INDIRECT_PREFIXES: &[&str] = &[
    "&",
    "*const ",
    "*mut ",
    "alloc::boxed::Box<",
    "alloc::sync::Arc<",
    "alloc::sync::Weak<",
    "alloc::rc::Rc<",
    "alloc::rc::Weak<",
    "core::pin::Pin<",
];

fn kind_of(name: &str) -> TargetKind {
    if INDIRECT_PREFIXES.iter().any(|prefix| name.starts_with(prefix)) {
        TargetKind::Indirect
    } else {
        TargetKind::Value
    }
}

/// Erased construction body of a registered target.
///
/// Produced by [`Target::into_construction`]; opaque outside the crate.
pub struct Construction(pub(crate) Body);

pub(crate) enum Body {
    Constant(AnyArc),
    Factory(FactoryFn),
}

impl Construction {
    fn constant(value: AnyArc) -> Self {
        Construction(Body::Constant(value))
    }

    fn factory<F>(f: F) -> Self
    where
        F: Fn(&[AnyArc]) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        Construction(Body::Factory(Arc::new(f)))
    }
}

/// A type that can be declared as a parameter of a factory or invocation target.
pub trait Inject: Sized {
    /// Identity resolved for this parameter.
    fn key() -> Key;

    /// Extracts the parameter from a resolved instance.
    fn from_instance(instance: &AnyArc) -> DiResult<Self>;
}

impl<T> Inject for Arc<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    #[inline]
    fn key() -> Key {
        Key::of::<T>()
    }

    #[inline]
    fn from_instance(instance: &AnyArc) -> DiResult<Self> {
        instance
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or(DiError::TypeMismatch(type_name::<T>()))
    }
}

/// Something that can be registered: a factory function or a [`Constant`].
///
/// The `Marker` parameter only disambiguates the blanket implementations and
/// is always inferred.
pub trait Target<Marker>: Send + Sync + 'static {
    /// True for factories.
    fn is_callable(&self) -> bool;

    /// Parameter identities in declaration order (empty for constants).
    fn parameter_types(&self) -> Vec<Key>;

    /// Own identity, kind and parameters; fails for factories that do not
    /// return exactly one value.
    fn classify(&self) -> DiResult<Classification>;

    /// Erases the target into its construction body.
    fn into_construction(self) -> Construction;
}

/// Something that can be passed to [`Container::invoke`](crate::Container::invoke).
///
/// Invocation targets run once, so any `FnOnce` qualifies and may borrow from
/// the caller's stack.
pub trait Invocable<Marker> {
    /// False for values that cannot be called.
    fn is_callable(&self) -> bool;

    /// Parameter identities in declaration order.
    fn parameter_types(&self) -> Vec<Key>;

    /// Calls the target with resolved arguments and judges its return value.
    fn call(self, args: &[AnyArc]) -> DiResult<()>;
}

/// How an invocation target's return value is judged.
///
/// `()` always succeeds; `Result::Err` fails the invocation and the `Ok`
/// value is discarded. These are the only accepted return types: a target
/// returning anything else is rejected at compile time, so wrap a plain value
/// in `Ok` (or end the closure with `;`) to have it discarded.
///
/// ```
/// use ferrous_ioc::{Constant, Container};
/// use std::sync::Arc;
///
/// let container = Container::new();
/// container.register(Constant::new(2u32)).unwrap();
/// container
///     .invoke(|n: Arc<u32>| Ok::<_, std::io::Error>(*n * 2))
///     .unwrap();
/// ```
///
/// ```compile_fail
/// use ferrous_ioc::{Constant, Container};
/// use std::sync::Arc;
///
/// let container = Container::new();
/// container.register(Constant::new(2u32)).unwrap();
/// container.invoke(|n: Arc<u32>| *n * 2).unwrap();
/// ```
pub trait InvokeOutput {
    fn into_outcome(self) -> Result<(), Box<dyn Error + Send + Sync>>;
}

impl InvokeOutput for () {
    #[inline]
    fn into_outcome(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

impl<T, E> InvokeOutput for Result<T, E>
where
    E: Into<Box<dyn Error + Send + Sync>>,
{
    #[inline]
    fn into_outcome(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.map(|_| ()).map_err(Into::into)
    }
}

/// An already-constructed instance registered as-is.
///
/// Constants are never re-invoked and are always container-managed.
///
/// ```rust
/// use ferrous_ioc::{Constant, Container, Resolver};
/// use std::sync::Arc;
///
/// trait Greeting: Send + Sync {
///     fn text(&self) -> &str;
/// }
/// struct Hello;
/// impl Greeting for Hello {
///     fn text(&self) -> &str { "hello" }
/// }
///
/// let container = Container::new();
/// container.register(Constant::new(42u16)).unwrap();
/// container.register(Constant::from_arc(Arc::new(Hello) as Arc<dyn Greeting>)).unwrap();
///
/// assert_eq!(*container.get_required::<u16>(), 42);
/// assert_eq!(container.get_required::<dyn Greeting>().text(), "hello");
/// ```
pub struct Constant<T: ?Sized> {
    value: Arc<T>,
}

impl<T> Constant<T> {
    pub fn new(value: T) -> Self {
        Self { value: Arc::new(value) }
    }
}

impl<T: ?Sized> Constant<T> {
    /// Wraps an existing shared instance, e.g. an `Arc<dyn Trait>`.
    pub fn from_arc(value: Arc<T>) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &Arc<T> {
        &self.value
    }
}

/// Marker for [`Constant`] targets.
pub struct ConstantMarker;

impl<T> Target<ConstantMarker> for Constant<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn is_callable(&self) -> bool {
        false
    }

    fn parameter_types(&self) -> Vec<Key> {
        Vec::new()
    }

    fn classify(&self) -> DiResult<Classification> {
        Ok(Classification::constant::<T>())
    }

    fn into_construction(self) -> Construction {
        Construction::constant(Arc::new(self.value))
    }
}

impl<T: ?Sized> Invocable<ConstantMarker> for Constant<T> {
    fn is_callable(&self) -> bool {
        false
    }

    fn parameter_types(&self) -> Vec<Key> {
        Vec::new()
    }

    fn call(self, _args: &[AnyArc]) -> DiResult<()> {
        Err(DiError::TargetMustBeCallable(type_name::<T>()))
    }
}

#[inline]
fn next_argument<'a>(args: &mut slice::Iter<'a, AnyArc>, name: &'static str) -> DiResult<&'a AnyArc> {
    args.next().ok_or(DiError::TypeMismatch(name))
}

macro_rules! impl_targets {
    ($($param:ident),*) => {
        impl<Func, R, $($param,)*> Target<fn($($param,)*) -> R> for Func
        where
            Func: Fn($($param),*) -> R + Send + Sync + 'static,
            R: Send + Sync + 'static,
            $($param: Inject,)*
        {
            fn is_callable(&self) -> bool {
                true
            }

            fn parameter_types(&self) -> Vec<Key> {
                vec![$(<$param as Inject>::key()),*]
            }

            fn classify(&self) -> DiResult<Classification> {
                Classification::factory::<R>(vec![$(<$param as Inject>::key()),*])
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn into_construction(self) -> Construction {
                Construction::factory(move |args: &[AnyArc]| {
                    let mut args = args.iter();
                    $(
                        let $param = <$param as Inject>::from_instance(
                            next_argument(&mut args, type_name::<$param>())?,
                        )?;
                    )*
                    Ok(Arc::new(Arc::new((self)($($param),*))) as AnyArc)
                })
            }
        }

        impl<Func, R, $($param,)*> Invocable<fn($($param,)*) -> R> for Func
        where
            Func: FnOnce($($param),*) -> R,
            R: InvokeOutput,
            $($param: Inject,)*
        {
            fn is_callable(&self) -> bool {
                true
            }

            fn parameter_types(&self) -> Vec<Key> {
                vec![$(<$param as Inject>::key()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn call(self, args: &[AnyArc]) -> DiResult<()> {
                let mut args = args.iter();
                $(
                    let $param = <$param as Inject>::from_instance(
                        next_argument(&mut args, type_name::<$param>())?,
                    )?;
                )*
                (self)($($param),*).into_outcome().map_err(DiError::from_invocation)
            }
        }
    };
}

impl_targets!();
impl_targets!(A1);
impl_targets!(A1, A2);
impl_targets!(A1, A2, A3);
impl_targets!(A1, A2, A3, A4);
impl_targets!(A1, A2, A3, A4, A5);
impl_targets!(A1, A2, A3, A4, A5, A6);
impl_targets!(A1, A2, A3, A4, A5, A6, A7);
impl_targets!(A1, A2, A3, A4, A5, A6, A7, A8);
impl_targets!(A1, A2, A3, A4, A5, A6, A7, A8, A9);
impl_targets!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10);

/// Front door to the reflection traits, used by the container.
pub struct TypeReflector;

impl TypeReflector {
    /// Own identity, kind and parameters of a registration target.
    pub fn classify<M, T: Target<M>>(target: &T) -> DiResult<Classification> {
        target.classify()
    }

    /// Declared dependencies of an invocation target.
    pub fn parameter_types_of<M, T: Invocable<M>>(callable: &T) -> Vec<Key> {
        callable.parameter_types()
    }

    pub fn is_callable<M, T: Invocable<M>>(value: &T) -> bool {
        value.is_callable()
    }
}
