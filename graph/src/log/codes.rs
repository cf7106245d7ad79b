use std::fmt::{Display, Error, Formatter};

/// Codes attached to log lines with `"code" => LogCode::...` so that
/// log processing can pick out important events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogCode {
    GraphQlQuerySuccess,
    GraphQlQueryFailure,
    BatchLoadFailure,
    SubscriptionPublishFailure,
    SubscriptionLagging,
}

impl Display for LogCode {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        let value = match self {
            LogCode::GraphQlQuerySuccess => "GraphQlQuerySuccess",
            LogCode::GraphQlQueryFailure => "GraphQlQueryFailure",
            LogCode::BatchLoadFailure => "BatchLoadFailure",
            LogCode::SubscriptionPublishFailure => "SubscriptionPublishFailure",
            LogCode::SubscriptionLagging => "SubscriptionLagging",
        };
        write!(f, "{}", value)
    }
}

impl slog::Value for LogCode {
    fn serialize(
        &self,
        _rec: &slog::Record,
        key: slog::Key,
        serializer: &mut dyn slog::Serializer,
    ) -> slog::Result {
        serializer.emit_str(key, format!("{}", self).as_str())
    }
}
