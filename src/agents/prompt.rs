use once_cell::sync::Lazy;

use super::tools::CalendarTool;

static SYSTEM_PREAMBLE: Lazy<String> = Lazy::new(build_preamble);

/// System prompt describing the calendar tools and the tool-call format
pub fn system_preamble() -> &'static str {
    &SYSTEM_PREAMBLE
}

fn build_preamble() -> String {
    let mut prompt = String::from(
        "You are a helpful assistant that can manage Google Calendar.\n\
         You have access to these tools:\n",
    );

    for tool in CalendarTool::ALL {
        prompt.push_str(&format!("- {}: {}\n", tool.name(), tool.description()));
    }

    prompt.push_str(
        "\nWhen you need to use a tool, respond with a JSON object in this format:\n\
         ```json\n\
         {\n  \"name\": \"tool-name\",\n  \"args\": {\n    \"param1\": \"value1\",\n    \"param2\": \"value2\"\n  }\n}\n\
         ```\n\
         After using tools, provide a helpful, concise response to the user's query.\n",
    );

    prompt
}
