//! Task descriptions and expected outputs

use crew_prompt::{JinjaTemplate, Result};

pub const PRICE_TASK: &str = "stock.task.price.description";
pub const PRICE_TASK_OUTPUT: &str = "stock.task.price.expected_output";
pub const NEWS_TASK: &str = "stock.task.news.description";
pub const NEWS_TASK_OUTPUT: &str = "stock.task.news.expected_output";
pub const WRITE_TASK: &str = "stock.task.write.description";
pub const WRITE_TASK_OUTPUT: &str = "stock.task.write.expected_output";

pub fn price_task() -> Result<JinjaTemplate> {
    JinjaTemplate::new(
        PRICE_TASK,
        "Analyse the {{ ticker }} stock price history of the last 52 weeks up to {{ current_date }} \
         and create a trend analysis of up, down or sideways.",
    )
}

pub fn price_task_output() -> Result<JinjaTemplate> {
    JinjaTemplate::new(
        PRICE_TASK_OUTPUT,
        "Specify the current trend stock price - up, down or sideways.\n\
         eg. stock='{{ ticker }}, price up'",
    )
}

pub fn news_task() -> Result<JinjaTemplate> {
    JinjaTemplate::new(
        NEWS_TASK,
        r"Take the stock and always include {{ reference_asset }} to it (if not requested).
Use the search tool to search each one individually: {{ assets | join(', ') }}.
The current date is {{ current_date }}.
Compose the results into a helpful report.",
    )
}

pub fn news_task_output() -> Result<JinjaTemplate> {
    JinjaTemplate::new(
        NEWS_TASK_OUTPUT,
        r"A summary of the overall market and a one sentence summary for each requested asset.
Include a fear/greed score for each asset based on the news. Use the format:
<STOCK ASSET>
<SUMMARY BASED ON NEWS>
<TREND PREDICTION>
<FEAR/GREED SCORE>",
    )
}

pub fn write_task() -> Result<JinjaTemplate> {
    JinjaTemplate::new(
        WRITE_TASK,
        r"Use the stock price trend and the stock news report to create an analysis and write the newsletter
about the {{ ticker }} company that is brief and highlights the most important points.
Focus on the stock price trend, news and fear/greed score. What are the near future considerations?
Include the previous analysis of stock trend and news summary.",
    )
}

pub fn write_task_output() -> Result<JinjaTemplate> {
    JinjaTemplate::new(
        WRITE_TASK_OUTPUT,
        r"An eloquent 3 paragraphs newsletter formatted as markdown in an easy readable manner. It should contain:
- 3 bullets executive summary
- Introduction - set the overall picture and spike up the interest
- Main part provides the meat of the analysis including the news summary and fear/greed scores
- Summary - key facts and concrete future trend prediction - up, down or sideways.
Use the headings: ## Executive Summary, ## Introduction, ## Main Analysis, ## Summary",
    )
}
