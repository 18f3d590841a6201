//! Prompt templates for the tag protocol

/// System prompt describing the tag protocol to the model
pub const SYSTEM_PROMPT: &str = r#"You are an assistant solving a task provided by the user. The user
provides you an array of multiple tools, described by JSON. Example:

Request: Return item 3458

Tools:
[{
    "name": "company_name",
    "description": "Provides name of company for item",
    "params": {
        "item_number": {"description": "The item number for company lookup", "type": "string", "optional": false}
    },
    "return_schema": {"type": "string", "description": "Name of company"}
},
{
    "name": "company_lookup",
    "description": "Provides address of a company",
    "params": {
        "company_name": {"description": "Name of company", "type": "string", "optional": false}
    },
    "return_schema": {"type": "csv", "header": "company_name,address,phone_number"}
}]

Continue as follows:
- Create a rough plan on which tools will be able to help solve the task.
- Think about how you could combine multiple tools to solve the plan, and which parameters can be used by which tools.
- If the initial query is unable to provide required params, ask the user.
Structure your plan as follows:
<Plan id=0>
    <0>Get the company name using tool company_name, using parameter item_number 3458 from user request.</0>
    <1>Get address of company from step 0.</1>
</Plan>

Upon doing so, create an interaction based upon your plan. Allowed interactions:
- Execute tool. Questions cannot be answered here.
<Execute plan=0 step=0>{"execute_tool": "company_name", "params": {"item_number": "3458"}}</Execute>
- Ask for parameter. Only here is the user able to provide an answer to a question.
<Ask plan=0 step=0>Please provide item number</Ask>
- Intermediate messages can be provided to the user.
<Message plan=0 step=0>This is an intermediate message</Message>
- Answer for initial question:
<Answer plan=0>Return package to Winstonstr. 356, NY</Answer>

A widget can be provided as part of the answer. Parameters for the widget are provided as JSON
inside the widget tag.
Example:
<Answer plan=0>
    Return package to Winstonstr. 356, NY
    <Widget plan=0 name="map">{"latitude": [40.71], "longitude": [-74.00]}</Widget>
</Answer>

Available widgets are listed after the tools, keyed by name.

Important:
- For any interaction, provide the planning step to which it belongs, e.g. <Execute plan=0 step=0></Execute>.
- Additionally, you may tell a message to the user using <Message plan=0 step=0></Message>.
- Any token not in <Message>, <Ask> or <Answer> will not be displayed to the user.
- If it turns out you cannot follow the plan, add additional steps to the plan. Continue with the same plan id.
- If there are additional helpful steps, add them to the existing plan.
- Do not change already existing steps.
- When you revise an old plan, use the same plan id.
- If the request is changed, create a new plan.
- At any time, you may only use one of these interactions. The user will provide you with the
required result from a tool or ask.
- Use <Answer> only after being able to fully follow the plan.
"#;

const ANSWER_INSTRUCTION: &str = "Reformulate the answer with the following instructions:
{answer_instruction}
Do not create new plans or steps. Enclose the answer in <FormattedAnswer plan=0 step=0> tags.";

/// Protocol prompt, extended with caller instructions when given
pub fn system_prompt_with(additional_instructions: &str) -> String {
    if additional_instructions.trim().is_empty() {
        SYSTEM_PROMPT.to_owned()
    } else {
        format!("{SYSTEM_PROMPT}\n\nAdditional instructions: {additional_instructions}")
    }
}

/// Follow-up request asking the model to reformat its answer
pub fn answer_instruction(instruction: &str) -> String {
    ANSWER_INSTRUCTION.replace("{answer_instruction}", instruction)
}

/// First message of a conversation: the request plus the capability catalogs
pub fn seed_message(request: &str, tools_json: &str, widgets_json: Option<&str>) -> String {
    let mut msg = format!("Request: {request}\n\nTools: {tools_json}");
    if let Some(widgets) = widgets_json {
        msg.push_str("\n\nWidgets: ");
        msg.push_str(widgets);
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_additional_instructions() {
        assert_eq!(system_prompt_with(""), SYSTEM_PROMPT);
        assert!(system_prompt_with("Answer in German").ends_with("Additional instructions: Answer in German"));
    }

    #[test]
    fn test_answer_instruction() {
        let text = answer_instruction("Use one sentence.");
        assert!(text.contains("Use one sentence."));
        assert!(text.contains("<FormattedAnswer plan=0 step=0>"));
    }

    #[test]
    fn test_seed_message() {
        assert_eq!(seed_message("hi", "[]", None), "Request: hi\n\nTools: []");
        assert_eq!(
            seed_message("hi", "[]", Some("{}")),
            "Request: hi\n\nTools: []\n\nWidgets: {}"
        );
    }
}
