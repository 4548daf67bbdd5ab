use anyhow::Context;
use forecast_core::WeatherContext;
use minijinja::Environment;

const INDEX: &str = "index.html";

/// Renders the forecast page; `.html` templates are auto-escaped.
#[derive(Debug)]
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> anyhow::Result<Self> {
        let mut env = Environment::new();
        env.add_template(INDEX, include_str!("../templates/index.html"))
            .context("Failed to compile page template")?;
        Ok(Self { env })
    }

    pub fn render(&self, ctx: &WeatherContext) -> anyhow::Result<String> {
        let template = self.env.get_template(INDEX)?;
        template.render(ctx).context("Failed to render page")
    }
}
