//! `tracing` integration
//!
//! [`RotatingLayer`] turns `tracing` events into records for a
//! [`RotatingHandler`]. Fields of the enclosing spans become attributes of
//! the record, inner spans overriding outer ones and the event's own fields
//! overriding both. Level filtering is left to the subscriber stack.

use std::fmt;

use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::{span, Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::attrs::Attributes;
use super::handler::RotatingHandler;
use super::record::{Level, LogRecord};

/// Target prefix of this crate's own diagnostics
const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Field name `tracing` uses for the formatted message
const MESSAGE_FIELD: &str = "message";

/// Layer writing every event it sees through a [`RotatingHandler`]
#[derive(Debug, Clone)]
pub struct RotatingLayer {
    handler: RotatingHandler,
}

impl RotatingLayer {
    /// Create a layer writing through `handler`
    pub fn new(handler: RotatingHandler) -> Self {
        Self { handler }
    }
}

/// Check if `target` belongs to this crate
///
/// The sink's own diagnostics must not be fed back into it, or a failing
/// write would log about itself forever.
pub(crate) fn is_own_target(target: &str) -> bool {
    target == OWN_TARGET
        || target
            .strip_prefix(OWN_TARGET)
            .is_some_and(|rest| rest.starts_with("::"))
}

/// Visitor that extracts the message and fields from a tracing event
#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: Attributes,
}

impl EventVisitor {
    fn record_value(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name(), value);
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == MESSAGE_FIELD {
            self.message = format!("{:?}", value);
        } else {
            self.record_value(field, Value::String(format!("{:?}", value)));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == MESSAGE_FIELD {
            self.message = value.to_string();
        } else {
            self.record_value(field, Value::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_value(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, Value::from(value));
    }
}

/// Fields recorded on a span, stored in its extensions
struct SpanFields(Attributes);

impl<S> Layer<S> for RotatingLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        let mut visitor = EventVisitor::default();
        attrs.record(&mut visitor);

        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanFields(visitor.fields));
        }
    }

    fn on_record(&self, id: &span::Id, values: &span::Record<'_>, ctx: Context<'_, S>) {
        let mut visitor = EventVisitor::default();
        values.record(&mut visitor);

        if let Some(span) = ctx.span(id) {
            let mut extensions = span.extensions_mut();
            match extensions.get_mut::<SpanFields>() {
                Some(SpanFields(fields)) => fields.merge(&visitor.fields),
                None => extensions.insert(SpanFields(visitor.fields)),
            }
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_own_target(metadata.target()) {
            return;
        }

        let level = Level::from(*metadata.level());
        if !self.handler.is_enabled(level) {
            return;
        }

        // Outermost span first so inner spans win
        let mut span_fields = Attributes::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(SpanFields(fields)) = span.extensions().get::<SpanFields>() {
                    span_fields.merge(fields);
                }
            }
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let record = LogRecord {
            timestamp: self.handler.now(),
            level,
            message: visitor.message,
            fields: span_fields,
        };

        // Nowhere else to report this without recursing into the sink
        if let Err(e) = self.handler.emit(&record, &visitor.fields) {
            eprintln!("Failed to write log record: {}", e);
        }
    }
}
