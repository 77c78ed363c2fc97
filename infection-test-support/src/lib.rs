//! Shared test utilities used across infection crates.
//!
//! The crate deliberately avoids depending on `infection-core` so the core
//! crate can use it as a dev-dependency; fixtures are expressed with the plain
//! `BTreeMap` shapes the core accepts.

pub mod fixtures {
    //! Small, hand-checked populations reused by unit and integration tests.
    use std::collections::BTreeMap;

    /// Directed edge lists keyed by user, matching `infection_core::UserGraph`.
    pub type Graph = BTreeMap<String, Vec<String>>;

    /// Versions keyed by user, matching `infection_core::UserVersions`.
    pub type Versions = BTreeMap<String, u64>;

    /// Builds a graph with an entry for every user in `users` followed by the
    /// directed `edges` in order. Sources missing from `users` gain an entry.
    ///
    /// # Examples
    /// ```
    /// use infection_test_support::fixtures::graph_from;
    ///
    /// let graph = graph_from(&["A", "B"], &[("A", "B")]);
    /// assert_eq!(graph["A"], ["B"]);
    /// assert!(graph["B"].is_empty());
    /// ```
    #[must_use]
    pub fn graph_from(users: &[&str], edges: &[(&str, &str)]) -> Graph {
        let mut graph: Graph = users
            .iter()
            .map(|user| ((*user).to_owned(), Vec::new()))
            .collect();
        for (from, to) in edges {
            graph
                .entry((*from).to_owned())
                .or_default()
                .push((*to).to_owned());
        }
        graph
    }

    /// Assigns `version` to every user in `users`.
    #[must_use]
    pub fn versions_from(users: &[&str], version: u64) -> Versions {
        users
            .iter()
            .map(|user| ((*user).to_owned(), version))
            .collect()
    }

    /// The directed three-cycle `A -> B -> C -> A`.
    #[must_use]
    pub fn cycle_graph() -> Graph {
        graph_from(&["A", "B", "C"], &[("A", "B"), ("B", "C"), ("C", "A")])
    }

    /// The three-cycle plus two isolated users `D` and `E`, all at version 0.
    #[must_use]
    pub fn cycle_with_isolated_pair() -> (Versions, Graph) {
        (
            versions_from(&["A", "B", "C", "D", "E"], 0),
            graph_from(&["D", "E"], &[("A", "B"), ("B", "C"), ("C", "A")]),
        )
    }

    /// Disjoint chains of the given sizes, named `c{chain}_{position}`.
    ///
    /// Each chain links consecutive members, so every chain is a single
    /// connected component of exactly the requested size.
    #[must_use]
    pub fn chains(sizes: &[usize]) -> (Versions, Graph) {
        let mut versions = Versions::new();
        let mut graph = Graph::new();
        for (chain, &size) in sizes.iter().enumerate() {
            let names: Vec<String> = (0..size).map(|at| format!("c{chain}_{at}")).collect();
            for (position, name) in names.iter().enumerate() {
                versions.insert(name.clone(), 0);
                let next = names.get(position + 1).cloned().into_iter().collect();
                graph.insert(name.clone(), next);
            }
        }
        (versions, graph)
    }
}

pub mod tracing {
    //! Recording layer used to assert spans and events emitted by the core.
    use std::collections::HashMap;
    use std::fmt;
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    use tracing::field::{Field, Visit};
    use tracing::span::{Attributes, Id, Record};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::Context;
    use tracing_subscriber::registry::LookupSpan;

    /// Captures closed spans and emitted events for later assertions.
    ///
    /// # Examples
    /// ```
    /// use infection_test_support::tracing::RecordingLayer;
    /// use tracing_subscriber::layer::SubscriberExt;
    ///
    /// let layer = RecordingLayer::default();
    /// let subscriber = tracing_subscriber::registry().with(layer.clone());
    /// tracing::subscriber::with_default(subscriber, || {
    ///     let _span = tracing::info_span!("demo", users = 3).entered();
    ///     tracing::info!(count = 2, "infected");
    /// });
    /// assert_eq!(layer.spans()[0].name, "demo");
    /// assert_eq!(layer.events()[0].fields["count"], "2");
    /// ```
    #[derive(Clone, Default)]
    pub struct RecordingLayer {
        spans: Arc<Mutex<Vec<SpanRecord>>>,
        events: Arc<Mutex<Vec<EventRecord>>>,
    }

    impl RecordingLayer {
        /// Closed spans in completion order.
        #[must_use]
        pub fn spans(&self) -> Vec<SpanRecord> {
            lock(&self.spans).clone()
        }

        /// Emitted events in emission order.
        #[must_use]
        pub fn events(&self) -> Vec<EventRecord> {
            lock(&self.events).clone()
        }

        /// Returns the first closed span called `name`, if any.
        #[must_use]
        pub fn span(&self, name: &str) -> Option<SpanRecord> {
            lock(&self.spans)
                .iter()
                .find(|span| span.name == name)
                .cloned()
        }
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of a closed span.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SpanRecord {
        /// Span name from the callsite metadata.
        pub name: String,
        /// Fields recorded at creation or later via `Span::record`.
        pub fields: HashMap<String, String>,
    }

    /// Snapshot of an emitted event.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct EventRecord {
        /// Event level.
        pub level: Level,
        /// Structured fields, including `message`.
        pub fields: HashMap<String, String>,
    }

    struct PendingSpan(SpanRecord);

    impl<S> Layer<S> for RecordingLayer
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(id) else {
                return;
            };
            let mut fields = HashMap::new();
            attrs.record(&mut FieldCollector(&mut fields));
            span.extensions_mut().insert(PendingSpan(SpanRecord {
                name: attrs.metadata().name().to_owned(),
                fields,
            }));
        }

        fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(id) else {
                return;
            };
            if let Some(pending) = span.extensions_mut().get_mut::<PendingSpan>() {
                values.record(&mut FieldCollector(&mut pending.0.fields));
            }
        }

        fn on_close(&self, id: Id, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(&id) else {
                return;
            };
            if let Some(pending) = span.extensions_mut().remove::<PendingSpan>() {
                lock(&self.spans).push(pending.0);
            }
        }

        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut fields = HashMap::new();
            event.record(&mut FieldCollector(&mut fields));
            lock(&self.events).push(EventRecord {
                level: *event.metadata().level(),
                fields,
            });
        }
    }

    struct FieldCollector<'a>(&'a mut HashMap<String, String>);

    impl Visit for FieldCollector<'_> {
        fn record_str(&mut self, field: &Field, value: &str) {
            self.0.insert(field.name().to_owned(), value.to_owned());
        }

        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0.insert(field.name().to_owned(), format!("{value:?}"));
        }
    }
}

pub mod proptest_profile {
    //! Environment-driven case counts for property suites.
    use std::env;

    /// Environment variable overriding the number of property-test cases.
    pub const CASES_ENV_KEY: &str = "INFECTION_PBT_CASES";

    /// Returns the case count from [`CASES_ENV_KEY`], or `default_cases` when
    /// the variable is unset, unparsable or zero.
    ///
    /// # Examples
    /// ```
    /// use infection_test_support::proptest_profile::cases;
    ///
    /// assert!(cases(32) > 0);
    /// ```
    #[must_use]
    pub fn cases(default_cases: u32) -> u32 {
        let Ok(raw) = env::var(CASES_ENV_KEY) else {
            return default_cases;
        };
        match raw.trim().parse::<u32>() {
            Ok(parsed) if parsed > 0 => parsed,
            _ => {
                tracing::warn!(
                    env = CASES_ENV_KEY,
                    raw = %raw,
                    "invalid property-test case override; using default",
                );
                default_cases
            }
        }
    }
}
