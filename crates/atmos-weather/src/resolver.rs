//! Location resolution.
//!
//! Turns a normalized query into a single place using the geocoder and a
//! three-step matching ladder: every query word must match (strict), then
//! any word (relaxed, multi-word queries only), then the first result.

use std::sync::Arc;

use crate::geocode::GeocodingApi;
use crate::query::NormalizedQuery;
use crate::types::{CandidateLocation, Coordinates, DashboardError, ResolvedLocation};

/// Maximum candidates requested per geocoding call
pub const MAX_CANDIDATES: usize = 5;

/// Which rung of the ladder picked the candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Strict,
    Relaxed,
    FirstResult,
}

/// Pick a candidate for `query`, or `None` if there are no candidates.
pub fn select_candidate<'a>(
    query: &NormalizedQuery,
    candidates: &'a [CandidateLocation],
) -> Option<(&'a CandidateLocation, MatchKind)> {
    let words: Vec<&str> = query.words().collect();
    let texts: Vec<String> = candidates.iter().map(|c| c.comparison_text()).collect();

    let strict = texts
        .iter()
        .position(|text| words.iter().all(|w| text.contains(w)));
    if let Some(i) = strict {
        return Some((&candidates[i], MatchKind::Strict));
    }

    if words.len() > 1 {
        let relaxed = texts
            .iter()
            .position(|text| words.iter().any(|w| text.contains(w)));
        if let Some(i) = relaxed {
            return Some((&candidates[i], MatchKind::Relaxed));
        }
    }

    candidates.first().map(|c| (c, MatchKind::FirstResult))
}

#[derive(Clone)]
pub struct LocationResolver {
    geocoder: Arc<dyn GeocodingApi>,
}

impl LocationResolver {
    pub fn new(geocoder: Arc<dyn GeocodingApi>) -> Self {
        Self { geocoder }
    }

    /// Resolve free text to a place.
    ///
    /// Retries with only the first word when a multi-word query has no
    /// candidates at all.
    pub async fn resolve(
        &self,
        query: &NormalizedQuery,
    ) -> Result<ResolvedLocation, DashboardError> {
        let mut candidates = self.candidates(query.as_str()).await;

        if candidates.is_empty() && query.word_count() > 1 {
            if let Some(first) = query.first_word() {
                tracing::debug!(
                    "No candidates for {:?}, retrying with {:?}",
                    query.as_str(),
                    first
                );
                candidates = self.candidates(first).await;
            }
        }

        let (candidate, kind) = select_candidate(query, &candidates)
            .ok_or_else(|| DashboardError::NotFound(query.to_string()))?;

        let resolved = ResolvedLocation::from_candidate(candidate.clone());
        tracing::info!(
            "Resolved {:?} to {} ({:?} match)",
            query.as_str(),
            resolved.label,
            kind
        );
        Ok(resolved)
    }

    /// Build a location from known coordinates and label, skipping the geocoder.
    pub fn resolve_coordinates(coordinates: Coordinates, label: &str) -> ResolvedLocation {
        ResolvedLocation {
            label: label.to_string(),
            coordinates,
            candidate: None,
        }
    }

    /// Geocoder failures count as "no candidates".
    async fn candidates(&self, text: &str) -> Vec<CandidateLocation> {
        match self.geocoder.search(text, MAX_CANDIDATES).await {
            Ok(mut candidates) => {
                candidates.truncate(MAX_CANDIDATES);
                candidates
            }
            Err(e) => {
                tracing::warn!("Geocoding {:?} failed: {}", text, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::normalize;
    use crate::testing::FakeGeocoder;

    fn candidate(name: &str, state: Option<&str>, country: &str) -> CandidateLocation {
        CandidateLocation {
            name: name.into(),
            state: state.map(Into::into),
            country: country.into(),
            latitude: 0.0,
            longitude: 0.0,
        }
    }

    fn paris_pair() -> Vec<CandidateLocation> {
        vec![
            candidate("Paris", None, "FR"),
            candidate("Paris", Some("Texas"), "US"),
        ]
    }

    #[test]
    fn test_strict_match_uses_state() {
        let candidates = paris_pair();
        let (picked, kind) = select_candidate(&normalize("paris texas"), &candidates).unwrap();
        assert_eq!(picked.label(), "Paris, Texas, US");
        assert_eq!(kind, MatchKind::Strict);
    }

    #[test]
    fn test_strict_match_prefers_earlier_candidate() {
        let candidates = paris_pair();
        let (picked, kind) = select_candidate(&normalize("paris"), &candidates).unwrap();
        assert_eq!(picked.country, "FR");
        assert_eq!(kind, MatchKind::Strict);
    }

    #[test]
    fn test_relaxed_match_for_multi_word() {
        let candidates = vec![
            candidate("Springfield", Some("Illinois"), "US"),
            candidate("Portland", Some("Oregon"), "US"),
        ];
        let (picked, kind) =
            select_candidate(&normalize("portland maine"), &candidates).unwrap();
        assert_eq!(picked.name, "Portland");
        assert_eq!(kind, MatchKind::Relaxed);
    }

    #[test]
    fn test_single_word_skips_relaxed_pass() {
        let candidates = vec![candidate("Londrina", None, "BR"), candidate("Derry", None, "GB")];
        let (picked, kind) = select_candidate(&normalize("lonxyz"), &candidates).unwrap();
        assert_eq!(picked.name, "Londrina");
        assert_eq!(kind, MatchKind::FirstResult);
    }

    #[test]
    fn test_first_result_fallback() {
        let candidates = vec![candidate("Foo", None, "AA"), candidate("Bar", None, "BB")];
        let (picked, kind) = select_candidate(&normalize("qux quux"), &candidates).unwrap();
        assert_eq!(picked.name, "Foo");
        assert_eq!(kind, MatchKind::FirstResult);
    }

    #[test]
    fn test_no_candidates() {
        assert!(select_candidate(&normalize("anything"), &[]).is_none());
    }

    #[tokio::test]
    async fn test_resolve_paris_texas() {
        let geocoder = FakeGeocoder::new().with("paris texas", paris_pair());
        let resolver = LocationResolver::new(Arc::new(geocoder));

        let resolved = resolver.resolve(&normalize("Paris, Texas")).await.unwrap();
        assert_eq!(resolved.label, "Paris, Texas, US");
        assert!(resolved.candidate.is_some());
    }

    #[tokio::test]
    async fn test_resolve_retries_with_first_word() {
        let geocoder = FakeGeocoder::new().with("springfield", vec![
            candidate("Springfield", Some("Missouri"), "US"),
            candidate("Springfield", Some("Illinois"), "US"),
        ]);
        let calls = geocoder.calls();
        let resolver = LocationResolver::new(Arc::new(geocoder));

        let resolved = resolver
            .resolve(&normalize("springfield illinois usa"))
            .await
            .unwrap();

        // "usa" is not a substring of "springfield illinois us", so the relaxed pass picks
        assert_eq!(resolved.label, "Springfield, Missouri, US");
        assert_eq!(
            calls.lock().clone(),
            vec!["springfield illinois usa".to_string(), "springfield".to_string()]
        );
    }

    #[tokio::test]
    async fn test_resolve_not_found() {
        let geocoder = FakeGeocoder::new();
        let calls = geocoder.calls();
        let resolver = LocationResolver::new(Arc::new(geocoder));

        let result = resolver.resolve(&normalize("zzzqqnowhere")).await;
        assert!(matches!(result, Err(DashboardError::NotFound(q)) if q == "zzzqqnowhere"));
        // Single word: no first-word retry
        assert_eq!(calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_geocoder_failure_is_no_candidates() {
        let geocoder = FakeGeocoder::new().failing();
        let resolver = LocationResolver::new(Arc::new(geocoder));

        let result = resolver.resolve(&normalize("new york")).await;
        assert!(matches!(result, Err(DashboardError::NotFound(_))));
    }

    #[test]
    fn test_resolve_coordinates() {
        let resolved =
            LocationResolver::resolve_coordinates(Coordinates::new(35.68, 139.69), "Tokyo, JP");
        assert_eq!(resolved.label, "Tokyo, JP");
        assert_eq!(resolved.coordinates.latitude, 35.68);
        assert!(resolved.candidate.is_none());
    }
}
