//! Redirect decisions backed by memoized CMS existence lookups.

use super::path::{classify, encode_path, RoutePath};
use crate::cache::{Lookup, LookupCache};
use crate::cms::{DynCmsSource, EntityKind, EntitySummary};
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// What the middleware should do with a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RouteDecision {
    /// Serve the page; carries the entity when the path named one.
    Pass { entity: Option<EntitySummary> },
    Redirect { location: String, permanent: bool },
    NotFound,
}

impl RouteDecision {
    fn pass() -> Self {
        RouteDecision::Pass { entity: None }
    }

    /// Redirect to a path that is already in wire form.
    fn redirect_raw(mut location: String, query: Option<&str>, permanent: bool) -> Self {
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            location.push('?');
            location.push_str(query);
        }
        RouteDecision::Redirect {
            location,
            permanent,
        }
    }
}

/// Requested article slug against the CMS one; path normalization lowercases
/// the request and an empty CMS slug is reached as `/article/{id}`.
fn slug_matches(requested: Option<&str>, actual: &str) -> bool {
    match requested {
        None => actual.is_empty(),
        Some(requested) => requested.eq_ignore_ascii_case(actual),
    }
}

/// Redirect to `target` only if the target would itself be served, not
/// rewritten again, by [`classify`]. `None` means following it would loop.
fn settled_redirect(
    target: &str,
    query: Option<&str>,
    permanent: bool,
) -> Option<RouteDecision> {
    let location = encode_path(target);
    match classify(&location) {
        RoutePath::Normalize(_) | RoutePath::Invalid => {
            warn!("Canonical path {} is not stable, not redirecting", location);
            None
        }
        _ => Some(RouteDecision::redirect_raw(location, query, permanent)),
    }
}

pub struct Resolver {
    source: DynCmsSource,
    cache: Arc<LookupCache>,
}

impl Resolver {
    pub fn new(source: DynCmsSource, cache: Arc<LookupCache>) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &Arc<LookupCache> {
        &self.cache
    }

    /// Decide how to answer `path` (without query string); `query` is carried
    /// over to any redirect target.
    pub async fn resolve(&self, path: &str, query: Option<&str>) -> RouteDecision {
        let decision = match classify(path) {
            RoutePath::Bypass | RoutePath::Other | RoutePath::Archive { .. } => {
                RouteDecision::pass()
            }
            RoutePath::Normalize(target) => RouteDecision::redirect_raw(target, query, true),
            RoutePath::Invalid => RouteDecision::NotFound,
            RoutePath::Article { id, slug, legacy } => {
                match self.lookup(EntityKind::Article, &id.to_string()).await {
                    Ok(Some(summary)) => {
                        if !legacy && slug_matches(slug.as_deref(), &summary.slug) {
                            RouteDecision::Pass {
                                entity: Some(summary),
                            }
                        } else {
                            match settled_redirect(&summary.canonical_path, query, true) {
                                Some(decision) => decision,
                                None => RouteDecision::Pass {
                                    entity: Some(summary),
                                },
                            }
                        }
                    }
                    Ok(None) => RouteDecision::NotFound,
                    Err(_) => RouteDecision::pass(),
                }
            }
            RoutePath::Author(slug) => match self.lookup(EntityKind::Author, &slug).await {
                Ok(Some(summary)) => RouteDecision::Pass {
                    entity: Some(summary),
                },
                Ok(None) => RouteDecision::NotFound,
                Err(_) => RouteDecision::pass(),
            },
            RoutePath::Tag(slug) => {
                self.resolve_term(EntityKind::Tag, EntityKind::Category, &slug, query)
                    .await
            }
            RoutePath::Category(slug) => {
                self.resolve_term(EntityKind::Category, EntityKind::Tag, &slug, query)
                    .await
            }
        };

        debug!("Resolved {} -> {:?}", path, decision);
        decision
    }

    /// Tags and categories share a slug space: a miss on one kind is
    /// redirected (temporarily) to the other when it exists there.
    async fn resolve_term(
        &self,
        kind: EntityKind,
        fallback: EntityKind,
        slug: &str,
        query: Option<&str>,
    ) -> RouteDecision {
        match self.lookup(kind, slug).await {
            Ok(Some(summary)) => RouteDecision::Pass {
                entity: Some(summary),
            },
            Ok(None) => match self.lookup(fallback, slug).await {
                Ok(Some(other)) => settled_redirect(&other.canonical_path, query, false)
                    .unwrap_or(RouteDecision::NotFound),
                Ok(None) => RouteDecision::NotFound,
                Err(_) => RouteDecision::pass(),
            },
            Err(_) => RouteDecision::pass(),
        }
    }

    /// Cached existence check. Upstream failures are returned, never cached.
    pub async fn lookup(&self, kind: EntityKind, key: &str) -> Result<Option<EntitySummary>> {
        if let Some(hit) = self.cache.get(kind, key) {
            return Ok(hit.summary().cloned());
        }

        match self.source.lookup(kind, key).await {
            Ok(found) => {
                self.cache.store(kind, key, Lookup::from(found.clone()));
                Ok(found)
            }
            Err(e) => {
                warn!("Lookup of {} {} failed, passing request through: {}", kind, key, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_keeps_query_and_encodes() {
        let decision = settled_redirect("/tag/חד", Some("page=2"), false);
        assert_eq!(
            decision,
            Some(RouteDecision::Redirect {
                location: "/tag/%D7%97%D7%93?page=2".into(),
                permanent: false
            })
        );
    }

    #[test]
    fn test_raw_redirect_not_reencoded() {
        let decision = RouteDecision::redirect_raw("/tag/%D7%97".into(), None, true);
        assert_eq!(
            decision,
            RouteDecision::Redirect {
                location: "/tag/%D7%97".into(),
                permanent: true
            }
        );
    }

    #[test]
    fn test_redirect_ignores_empty_query() {
        let decision = settled_redirect("/author/dana", Some(""), true);
        assert_eq!(
            decision,
            Some(RouteDecision::Redirect {
                location: "/author/dana".into(),
                permanent: true
            })
        );
    }

    #[test]
    fn test_slug_matches() {
        assert!(slug_matches(Some("budget-vote"), "Budget-Vote"));
        assert!(slug_matches(None, ""));
        assert!(!slug_matches(None, "budget-vote"));
        assert!(!slug_matches(Some("x"), ""));
    }

    #[test]
    fn test_unstable_targets_are_not_redirected() {
        assert_eq!(settled_redirect("/article/8/", None, true), None);
        assert_eq!(settled_redirect("/tag/Elections", None, false), None);
        assert_eq!(
            settled_redirect("/tag/elections", Some("a=1"), false),
            Some(RouteDecision::Redirect {
                location: "/tag/elections?a=1".into(),
                permanent: false
            })
        );
    }

    #[test]
    fn test_decision_serialization() {
        let json = serde_json::to_value(RouteDecision::NotFound).unwrap();
        assert_eq!(json["action"], "not_found");

        let json = serde_json::to_value(RouteDecision::pass()).unwrap();
        assert_eq!(json["action"], "pass");
        assert!(json["entity"].is_null());
    }
}
