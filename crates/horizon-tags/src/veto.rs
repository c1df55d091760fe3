//! Permission gates for tag additions and removals.
//!
//! A host callback answers "may this tag be added (or removed)?" with a
//! [`Permission`], either immediately or as a future. [`VetoGate::permits`]
//! normalizes every answer into a single `bool`.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::error::VetoError;
use crate::tag::Tag;

/// A host's answer to a veto gate.
pub enum Permission {
    Grant,
    Deny,
    /// No opinion; treated as [`Grant`](Self::Grant).
    Unspecified,
    /// Answer later. `Ok(false)` and `Err(_)` deny.
    Deferred(BoxFuture<'static, Result<bool, VetoError>>),
}

impl Permission {
    /// Defer to a future.
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = Result<bool, VetoError>> + Send + 'static,
    {
        Self::Deferred(future.boxed())
    }

    /// Defer to a future that cannot fail.
    pub fn deferred_bool<F>(future: F) -> Self
    where
        F: Future<Output = bool> + Send + 'static,
    {
        Self::Deferred(future.map(Ok).boxed())
    }
}

impl From<bool> for Permission {
    fn from(allowed: bool) -> Self {
        if allowed { Self::Grant } else { Self::Deny }
    }
}

impl From<()> for Permission {
    fn from((): ()) -> Self {
        Self::Unspecified
    }
}

impl From<Option<bool>> for Permission {
    fn from(answer: Option<bool>) -> Self {
        answer.map_or(Self::Unspecified, Self::from)
    }
}

impl fmt::Debug for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grant => f.write_str("Grant"),
            Self::Deny => f.write_str("Deny"),
            Self::Unspecified => f.write_str("Unspecified"),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

type Callback = Arc<dyn Fn(&Tag) -> Permission + Send + Sync>;

/// Wraps an optional host callback into a uniform async yes/no.
#[derive(Clone, Default)]
pub struct VetoGate {
    callback: Option<Callback>,
}

impl VetoGate {
    /// A gate that grants everything.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// A gate that asks `callback`.
    pub fn new<F, P>(callback: F) -> Self
    where
        F: Fn(&Tag) -> P + Send + Sync + 'static,
        P: Into<Permission>,
    {
        Self {
            callback: Some(Arc::new(move |tag: &Tag| callback(tag).into())),
        }
    }

    /// Ask whether `tag` may proceed.
    ///
    /// The callback runs synchronously; only a deferred answer suspends.
    pub async fn permits(&self, tag: &Tag) -> bool {
        let Some(callback) = &self.callback else {
            return true;
        };
        match callback(tag) {
            Permission::Grant | Permission::Unspecified => true,
            Permission::Deny => {
                tracing::debug!(target: "horizon_tags::veto", "denied");
                false
            }
            Permission::Deferred(answer) => match answer.await {
                Ok(allowed) => {
                    tracing::debug!(target: "horizon_tags::veto", allowed, "deferred answer");
                    allowed
                }
                Err(err) => {
                    tracing::debug!(target: "horizon_tags::veto", %err, "deferred answer failed, denying");
                    false
                }
            },
        }
    }
}

impl fmt::Debug for VetoGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VetoGate")
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// The two gates a tag list consults.
#[derive(Debug, Clone, Default)]
pub struct Vetoes {
    pub on_adding: VetoGate,
    pub on_removing: VetoGate,
}

impl Vetoes {
    /// Set the gate consulted before additions.
    pub fn with_on_adding(mut self, gate: VetoGate) -> Self {
        self.on_adding = gate;
        self
    }

    /// Set the gate consulted before removals.
    pub fn with_on_removing(mut self, gate: VetoGate) -> Self {
        self.on_removing = gate;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag() -> Tag {
        Tag::with_text("text", "foo")
    }

    #[tokio::test]
    async fn test_missing_callback_grants() {
        assert!(VetoGate::permissive().permits(&tag()).await);
    }

    #[tokio::test]
    async fn test_immediate_answers() {
        assert!(VetoGate::new(|_: &Tag| true).permits(&tag()).await);
        assert!(!VetoGate::new(|_: &Tag| false).permits(&tag()).await);
        assert!(VetoGate::new(|_: &Tag| ()).permits(&tag()).await);
        assert!(VetoGate::new(|_: &Tag| None::<bool>).permits(&tag()).await);
    }

    #[tokio::test]
    async fn test_deferred_answers() {
        let yes = VetoGate::new(|_: &Tag| Permission::deferred_bool(async { true }));
        let no = VetoGate::new(|_: &Tag| Permission::deferred_bool(async { false }));
        let failed = VetoGate::new(|_: &Tag| {
            Permission::deferred(async { Err(VetoError::new("server unreachable")) })
        });

        assert!(yes.permits(&tag()).await);
        assert!(!no.permits(&tag()).await);
        assert!(!failed.permits(&tag()).await);
    }

    #[tokio::test]
    async fn test_callback_sees_the_candidate() {
        let gate = VetoGate::new(|tag: &Tag| tag.text("text") != "forbidden");
        assert!(gate.permits(&tag()).await);
        assert!(!gate.permits(&Tag::with_text("text", "forbidden")).await);
    }
}
