use futures03::stream::StreamExt;

use graph::prelude::*;

use crate::execution::{execute_operation, OperationScope};
use crate::query::{Operation, OperationKind};
use crate::schema::{FieldKind, Schema};

mod hub;

pub use self::hub::{EventStream, SubscriptionHub};

/// Options available for subscription execution.
pub struct SubscriptionExecutionOptions {
    /// The logger to use during subscription execution.
    pub logger: Logger,
    pub schema: Arc<Schema>,
    /// Where the events of the subscribed topic come from.
    pub hub: Arc<SubscriptionHub>,
}

/// Subscribes to the topic behind the single root field of `operation`
/// and turns every event into a response. The selection set below the
/// root field is executed against each event with a fresh operation
/// scope, so responses to different events never share cached values.
///
/// The stream ends when the hub shuts down; dropping it unsubscribes.
pub fn execute_subscription(
    operation: Operation,
    options: SubscriptionExecutionOptions,
) -> Result<SubscriptionResult, SubscriptionError> {
    let SubscriptionExecutionOptions {
        logger,
        schema,
        hub,
    } = options;

    if operation.kind != OperationKind::Subscription {
        return Err(QueryExecutionError::NotSupported(
            "Only subscriptions are supported".to_owned(),
        )
        .into());
    }

    let root_type = schema.root_type(OperationKind::Subscription)?;
    let field = match operation.selection_set.as_slice() {
        [field] => field,
        _ => return Err(QueryExecutionError::MultipleSubscriptionFields.into()),
    };
    let def = root_type.field(&field.name).ok_or_else(|| {
        QueryExecutionError::UnknownField(root_type.name.clone(), field.name.clone())
    })?;
    let event = match &def.kind {
        FieldKind::Subscribe { event } => event.clone(),
        _ => {
            return Err(QueryExecutionError::NotSupported(format!(
                "`{}` is not a subscription field",
                def.qualified_name
            ))
            .into())
        }
    };

    let logger = logger.new(o!("subscription" => event.clone()));
    info!(logger, "Execute subscription");

    let field_name = def.name.clone();
    let operation = Arc::new(operation);
    let responses = hub.subscribe(&event).then(move |value| {
        let logger = logger.cheap_clone();
        let schema = schema.cheap_clone();
        let operation = operation.cheap_clone();
        let root = Value::object(vec![(field_name.clone(), value)]);

        async move {
            let mut scope = OperationScope::detached(&logger);
            execute_operation(&mut scope, &schema, &operation, root).await
        }
    });

    Ok(responses.boxed())
}
