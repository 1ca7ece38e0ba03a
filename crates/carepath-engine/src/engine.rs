//! Decision engine
//!
//! Arbitrates between the decision sources in strict priority order:
//!
//! 1. Normalize the query; empty input gets a clarifying reply
//! 2. Cache lookup (a hit returns immediately)
//! 3. Crisis screen: a trigger or a screen fault returns a crisis response, never cached
//! 4. Scenario match: contextual override, cached
//! 5. Classifier: trusted category reply or generic fallback, cached
//!
//! Every step except the crisis screen fails safe by falling through to the
//! next one. The crisis screen fails high: a fault produces a safety response.

use crate::cache::{ResponseCache, ResponseStore};
use crate::config::EngineConfig;
use crate::formatter::ResponseFormatter;
use crate::templates::{ResponseLibrary, CRISIS_CORE, SAFETY_DEFAULT_CORE};
use carepath_classifiers::{
    ClassificationResult, Classifier, ClassifierAdapter, ConfidencePolicy, CrisisDetector,
    CrisisPhrases, CrisisScreen, LexiconModel, NaiveBayesModel, ScenarioCatalog, ScenarioMatch,
    ScenarioMatcher, ScenarioSource,
};
use carepath_core::{
    cache_key, is_answerable, normalize, Category, Error, Method, Query, ResponseEnvelope, Result,
};
use carepath_telemetry::MetricsCollector;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn};

/// The arbitration pipeline
pub struct DecisionEngine {
    crisis: Arc<dyn CrisisScreen>,
    scenarios: Arc<dyn ScenarioSource>,
    classifier: ClassifierAdapter,
    cache: Option<Arc<dyn ResponseStore>>,
    library: Arc<ResponseLibrary>,
    formatter: ResponseFormatter,
    policy: ConfidencePolicy,
    crisis_check_before_cache: bool,
    metrics: MetricsCollector,
}

impl DecisionEngine {
    /// Start building an engine
    pub fn builder() -> DecisionEngineBuilder {
        DecisionEngineBuilder::new()
    }

    /// Build an engine from configuration, loading any configured data files
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        Self::builder().config(config).load_sources()?.build()
    }

    /// Engine with built-in data and default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::builder().build()
    }

    /// Answer one query
    pub fn handle(&self, text: &str, session_id: Option<&str>) -> ResponseEnvelope {
        let start = Instant::now();
        let span = info_span!("handle", session = session_id.unwrap_or("-"));
        let _enter = span.enter();

        self.metrics.record_request();
        let envelope = self.decide(text, start);

        self.metrics.record_decision(envelope.method);
        self.metrics
            .record_latency(start.elapsed().as_micros() as u64);
        info!(
            method = %envelope.method,
            category = %envelope.category,
            confidence = envelope.confidence,
            cached = envelope.cached,
            "Query answered"
        );

        envelope
    }

    /// Answer a query value
    pub fn handle_query(&self, query: &Query) -> ResponseEnvelope {
        self.handle(&query.text, query.session_id.as_deref())
    }

    /// Metrics recorded by this engine
    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Threshold below which the classifier is not trusted
    pub fn confidence_threshold(&self) -> f32 {
        self.policy.threshold()
    }

    fn decide(&self, text: &str, start: Instant) -> ResponseEnvelope {
        let normalized = normalize(text);
        if !is_answerable(&normalized) {
            debug!("Malformed input, asking for clarification");
            return self.clarification(start);
        }

        let key = cache_key(&normalized);

        if self.crisis_check_before_cache {
            if let Some(envelope) = self.crisis_step(&normalized, start) {
                return envelope;
            }
        }

        if let Some(hit) = self.cache_lookup(&key, start) {
            return hit;
        }

        if !self.crisis_check_before_cache {
            if let Some(envelope) = self.crisis_step(&normalized, start) {
                return envelope;
            }
        }

        let envelope = match self.scenario_step(&normalized) {
            Some(found) => self.contextual_envelope(found, start),
            None => self.classification_envelope(&normalized, start),
        };

        self.cache_store(&key, &envelope);
        envelope
    }

    fn crisis_step(&self, normalized: &str, start: Instant) -> Option<ResponseEnvelope> {
        let assessment = guarded("crisis", || self.crisis.assess(normalized)).map_err(|e| match e {
            Error::DetectorFault(_) => e,
            other => Error::detector(other.to_string()),
        });

        match assessment {
            Ok(assessment) if assessment.triggered => {
                warn!(
                    phrase = assessment.matched_phrase.as_deref().unwrap_or(""),
                    "Crisis override"
                );
                Some(self.crisis_envelope(CRISIS_CORE, start))
            }
            Ok(_) => None,
            Err(e) => {
                error!(error = %e, "Crisis screen fault, escalating to safety response");
                self.metrics.record_fault("crisis");
                Some(self.crisis_envelope(SAFETY_DEFAULT_CORE, start))
            }
        }
    }

    fn scenario_step(&self, normalized: &str) -> Option<ScenarioMatch> {
        match guarded("scenario", || self.scenarios.match_query(normalized)) {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Scenario matcher fault, falling through to classifier");
                self.metrics.record_fault("scenario");
                None
            }
        }
    }

    fn cache_lookup(&self, key: &str, start: Instant) -> Option<ResponseEnvelope> {
        let cache = self.cache.as_ref()?;

        match guarded("cache", || cache.get(key)) {
            Ok(Some(envelope)) if !envelope.is_crisis => {
                self.metrics.record_cache_lookup(true);
                debug!("Cache hit");
                Some(envelope.as_cached(elapsed_ms(start)))
            }
            Ok(_) => {
                self.metrics.record_cache_lookup(false);
                None
            }
            Err(e) => {
                warn!(error = %e, "Cache read failed, treating as miss");
                self.metrics.record_fault("cache");
                self.metrics.record_cache_lookup(false);
                None
            }
        }
    }

    fn cache_store(&self, key: &str, envelope: &ResponseEnvelope) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        if envelope.is_crisis {
            return;
        }

        if let Err(e) = guarded("cache", || cache.put(key, envelope)) {
            warn!(error = %e, "Cache write failed");
            self.metrics.record_fault("cache");
        }
    }

    fn crisis_envelope(&self, core: &str, start: Instant) -> ResponseEnvelope {
        let text = self.formatter.format(core, Method::Crisis, Category::Crisis);
        ResponseEnvelope::new(text, Category::Crisis, 1.0, Method::Crisis)
            .with_generation_time(elapsed_ms(start))
    }

    fn contextual_envelope(&self, found: ScenarioMatch, start: Instant) -> ResponseEnvelope {
        let text = self.formatter.format(
            &found.response_template,
            Method::ContextualOverride,
            found.category,
        );
        ResponseEnvelope::new(
            text,
            found.category,
            found.confidence,
            Method::ContextualOverride,
        )
        .with_scenario(found.scenario_id)
        .with_generation_time(elapsed_ms(start))
    }

    fn classification_envelope(&self, normalized: &str, start: Instant) -> ResponseEnvelope {
        let result = self.classifier.classify(normalized);
        if result.fault.is_some() {
            self.metrics.record_fault("classifier");
        }

        if self.policy.accepts(&result) {
            if let Some(template) = self.library.response_for(result.category) {
                let text = self
                    .formatter
                    .format(template, Method::MlClassification, result.category);
                return ResponseEnvelope::new(
                    text,
                    result.category,
                    result.confidence,
                    Method::MlClassification,
                )
                .with_generation_time(elapsed_ms(start));
            }
            warn!(category = %result.category, "No response template for category");
        }

        self.fallback_envelope(&result, start)
    }

    fn fallback_envelope(&self, result: &ClassificationResult, start: Instant) -> ResponseEnvelope {
        debug!(
            predicted = %result.category,
            confidence = result.confidence,
            threshold = self.policy.threshold(),
            "Classifier not trusted, using fallback"
        );
        let text = self
            .formatter
            .format(self.library.fallback(), Method::Fallback, Category::General);
        ResponseEnvelope::new(text, Category::General, result.confidence, Method::Fallback)
            .with_generation_time(elapsed_ms(start))
    }

    fn clarification(&self, start: Instant) -> ResponseEnvelope {
        let text = self.formatter.format(
            self.library.clarification(),
            Method::Fallback,
            Category::Unknown,
        );
        ResponseEnvelope::new(text, Category::Unknown, 0.0, Method::Fallback)
            .with_generation_time(elapsed_ms(start))
    }
}

/// Builder for `DecisionEngine`; unset collaborators use built-in data
pub struct DecisionEngineBuilder {
    config: EngineConfig,
    crisis: Option<Arc<dyn CrisisScreen>>,
    scenarios: Option<Arc<dyn ScenarioSource>>,
    catalog: Option<ScenarioCatalog>,
    classifier: Option<Arc<dyn Classifier>>,
    cache: Option<Option<Arc<dyn ResponseStore>>>,
    library: Option<ResponseLibrary>,
    metrics: Option<MetricsCollector>,
}

impl DecisionEngineBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            crisis: None,
            scenarios: None,
            catalog: None,
            classifier: None,
            cache: None,
            library: None,
            metrics: None,
        }
    }

    /// Engine configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Crisis screen
    pub fn crisis(mut self, crisis: Arc<dyn CrisisScreen>) -> Self {
        self.crisis = Some(crisis);
        self
    }

    /// Scenario source; takes precedence over `catalog`
    pub fn scenarios(mut self, scenarios: Arc<dyn ScenarioSource>) -> Self {
        self.scenarios = Some(scenarios);
        self
    }

    /// Scenario catalog, matched with the configured template selection
    pub fn catalog(mut self, catalog: ScenarioCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Text model wrapped by the classifier adapter
    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Response store replacing the configured in-process cache
    pub fn cache(mut self, cache: Arc<dyn ResponseStore>) -> Self {
        self.cache = Some(Some(cache));
        self
    }

    /// Disable caching regardless of configuration
    pub fn without_cache(mut self) -> Self {
        self.cache = Some(None);
        self
    }

    /// Response library
    pub fn library(mut self, library: ResponseLibrary) -> Self {
        self.library = Some(library);
        self
    }

    /// Share a metrics collector
    pub fn metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Load the data files named in the configured sources
    ///
    /// Unset sources keep whatever the builder already holds.
    pub fn load_sources(mut self) -> Result<Self> {
        let sources = self.config.sources.clone();

        if let Some(path) = &sources.crisis_phrases_path {
            info!("Loading crisis phrases from: {}", path.display());
            let phrases = CrisisPhrases::from_file(path)?;
            self.crisis = Some(Arc::new(CrisisDetector::new(phrases)?));
        }
        if let Some(path) = &sources.catalog_path {
            info!("Loading scenario catalog from: {}", path.display());
            self.catalog = Some(ScenarioCatalog::from_file(path)?);
        }
        if let Some(path) = &sources.responses_path {
            info!("Loading response library from: {}", path.display());
            self.library = Some(ResponseLibrary::from_file(path)?);
        }
        if let Some(path) = &sources.model_path {
            info!("Loading classifier model from: {}", path.display());
            self.classifier = Some(Arc::new(NaiveBayesModel::from_file(path)?));
        }

        Ok(self)
    }

    pub fn build(self) -> Result<DecisionEngine> {
        self.config.validate()?;
        let policy = ConfidencePolicy::new(self.config.confidence_threshold)?;

        let crisis: Arc<dyn CrisisScreen> = match self.crisis {
            Some(crisis) => crisis,
            None => Arc::new(CrisisDetector::builtin()?),
        };

        let scenarios: Arc<dyn ScenarioSource> = match (self.scenarios, self.catalog) {
            (Some(scenarios), _) => scenarios,
            (None, Some(catalog)) => {
                Arc::new(ScenarioMatcher::new(catalog, self.config.template_selection)?)
            }
            (None, None) => Arc::new(ScenarioMatcher::builtin(self.config.template_selection)?),
        };

        let model: Arc<dyn Classifier> = match self.classifier {
            Some(model) => model,
            None => Arc::new(LexiconModel::new()?),
        };

        let cache: Option<Arc<dyn ResponseStore>> = match self.cache {
            Some(explicit) => explicit,
            None if self.config.cache.enabled => {
                Some(Arc::new(ResponseCache::from_config(&self.config.cache)?))
            }
            None => None,
        };

        let library = match self.library {
            Some(library) => {
                library.validate()?;
                library
            }
            None => ResponseLibrary::builtin()?,
        };

        info!(
            model = %model.name(),
            threshold = policy.threshold(),
            cache = cache.is_some(),
            crisis_check_before_cache = self.config.crisis_check_before_cache,
            "Decision engine ready"
        );

        Ok(DecisionEngine {
            crisis,
            scenarios,
            classifier: ClassifierAdapter::new(model),
            cache,
            library: Arc::new(library),
            formatter: ResponseFormatter::new(),
            policy,
            crisis_check_before_cache: self.config.crisis_check_before_cache,
            metrics: self.metrics.unwrap_or_default(),
        })
    }
}

impl Default for DecisionEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a pipeline step, turning a panic into an error
fn guarded<T>(step: &'static str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|_| Err(Error::internal(format!("{} step panicked", step))))
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::{DISCLAIMER_MARKER, EMERGENCY_MARKER};

    fn engine() -> DecisionEngine {
        DecisionEngine::builder()
            .config(EngineConfig {
                template_selection: carepath_classifiers::TemplateSelection::First,
                ..Default::default()
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_crisis_example() {
        let envelope = engine().handle("I want to kill myself", None);
        assert_eq!(envelope.method, Method::Crisis);
        assert!(envelope.is_crisis);
        assert!(envelope.response_text.contains(EMERGENCY_MARKER));
        assert!(!envelope.response_text.contains(DISCLAIMER_MARKER));
    }

    #[test]
    fn test_contextual_example() {
        let envelope = engine().handle("My elderly father has trouble getting out of bed", None);
        assert_eq!(envelope.method, Method::ContextualOverride);
        assert_eq!(envelope.category, Category::Mobility);
        assert_eq!(envelope.scenario_id.as_deref(), Some("bed_mobility"));
        assert!(envelope.response_text.contains("\n1. "));
        assert!(envelope.response_text.contains("\n2. "));
        assert!(envelope.response_text.contains(DISCLAIMER_MARKER));
    }

    #[test]
    fn test_low_confidence_example() {
        let envelope = engine().handle("xyzzy quux", None);
        assert_eq!(envelope.method, Method::Fallback);
        assert!(!envelope.is_crisis);
        assert!(envelope.response_text.contains(DISCLAIMER_MARKER));
    }

    #[test]
    fn test_classified_example() {
        let envelope = engine().handle("what are the side effects of her medication", None);
        assert_eq!(envelope.method, Method::MlClassification);
        assert_eq!(envelope.category, Category::Medication);
        assert!(envelope.confidence >= 0.5);
    }

    #[test]
    fn test_repeat_is_cached() {
        let engine = engine();
        let first = engine.handle("My elderly father has trouble getting out of bed", None);
        let second = engine.handle("My elderly father has trouble getting out of bed", None);

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.response_text, second.response_text);
        assert_eq!(first.category, second.category);
    }

    #[test]
    fn test_empty_input_clarifies() {
        let engine = engine();
        for text in ["", "   ", "???"] {
            let envelope = engine.handle(text, Some("s-1"));
            assert_eq!(envelope.method, Method::Fallback);
            assert_eq!(envelope.category, Category::Unknown);
            assert_eq!(envelope.confidence, 0.0);
            assert!(envelope.response_text.contains(DISCLAIMER_MARKER));
        }
    }

    #[test]
    fn test_handle_query() {
        let query = Query::new("I want to end my life").with_session("abc");
        let envelope = engine().handle_query(&query);
        assert_eq!(envelope.method, Method::Crisis);
    }

    #[test]
    fn test_metrics_recorded() {
        let engine = engine();
        engine.handle("I want to kill myself", None);
        engine.handle("xyzzy quux", None);
        engine.handle("xyzzy quux", None);

        let snapshot = engine.metrics().snapshot();
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.crisis, 1);
        assert_eq!(snapshot.fallback, 2);
        assert_eq!(snapshot.cache_hits, 1);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let result = DecisionEngine::builder()
            .config(EngineConfig {
                confidence_threshold: 2.0,
                ..Default::default()
            })
            .build();
        assert!(result.is_err());
    }
}
