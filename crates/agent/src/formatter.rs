use parley_core::domain::message::HandlerOutcome;
use parley_core::errors::HandlerError;

pub const APOLOGY_TEXT: &str =
    "Sorry, something went wrong while handling your message. Please try again later.";

/// Collapses any failure to the same user-safe apology.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResponseFormatter;

impl ResponseFormatter {
    pub fn format(&self, outcome: Result<HandlerOutcome, HandlerError>) -> String {
        match outcome {
            Ok(outcome) => outcome.text,
            Err(_) => APOLOGY_TEXT.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use parley_core::domain::message::HandlerOutcome;
    use parley_core::errors::{HandlerError, ServiceError};

    use super::{ResponseFormatter, APOLOGY_TEXT};

    #[test]
    fn success_text_is_returned_unchanged() {
        let text = "  spaced  \n text ";

        assert_eq!(ResponseFormatter.format(Ok(HandlerOutcome::new(text))), text);
    }

    #[test]
    fn failures_never_leak_details() {
        let failures = [
            HandlerError::MissingEntity("location".to_owned()),
            HandlerError::Upstream(ServiceError::Unreachable {
                endpoint: "weather".to_owned(),
                detail: "connection refused at 10.0.0.7".to_owned(),
            }),
            HandlerError::Template("unknown variable".to_owned()),
        ];

        for failure in failures {
            let response = ResponseFormatter.format(Err(failure));
            assert_eq!(response, APOLOGY_TEXT);
            assert!(!response.contains("10.0.0.7"));
        }
    }
}
