use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use mnemo_engine::{
    core_toolkit, Agent, AppConfig, GeminiClient, Mem0Client, MemoryAdapter, Result,
    WeatherClient, WeatherTool,
};

const DEMO_OWNER: &str = "demo-user";

const DEMO_QUERIES: [&str; 4] = [
    "What will be the date 45 days from today?",
    "Analyze this paragraph: I am very happy with the excellent service.",
    "What is (234 * 12) + 98?",
    "What is today's weather in Chandigarh and suggest clothing accordingly?",
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env()?;

    let mut tools = core_toolkit();
    tools.register(WeatherTool::new(WeatherClient::from_config(&config)?));

    let agent = Agent::new(
        Arc::new(GeminiClient::from_config(&config)?),
        MemoryAdapter::new(Arc::new(Mem0Client::from_config(&config)?)),
    )
    .with_tools(tools);

    for query in DEMO_QUERIES {
        println!("\nUser: {query}");
        let reply = agent.respond_to(query, DEMO_OWNER).await?;
        println!("Agent: {}", reply.content);
    }

    Ok(())
}
