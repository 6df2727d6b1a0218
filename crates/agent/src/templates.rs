use tera::{Context, Tera};

pub use tera::Error as TemplateError;

const WEATHER_REPORT: &str = "weather_report.txt";

const WEATHER_REPORT_TEMPLATE: &str = "The weather in {{ location }} is currently {{ description }} with a temperature of {{ temperature }}{{ unit }}.";

/// Plain-text reply templates, compiled once at start-up.
#[derive(Clone)]
pub struct ReplyTemplates {
    tera: Tera,
}

impl ReplyTemplates {
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.add_raw_template(WEATHER_REPORT, WEATHER_REPORT_TEMPLATE)?;
        Ok(Self { tera })
    }

    pub fn weather_report(
        &self,
        location: &str,
        description: &str,
        temperature: f64,
        unit: &str,
    ) -> Result<String, TemplateError> {
        let mut context = Context::new();
        context.insert("location", location);
        context.insert("description", description);
        // f64 Display drops a trailing `.0`; tera's number rendering does not.
        context.insert("temperature", &temperature.to_string());
        context.insert("unit", unit);
        self.tera.render(WEATHER_REPORT, &context)
    }
}
