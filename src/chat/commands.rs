/// A line typed at the interactive prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Clear,
    ListModels,
    ListTools,
    SwitchModel(String),
    /// `/model` without a name
    ModelUsage,
    Chat(String),
    Empty,
}

pub fn parse_command(line: &str) -> Command {
    let input = line.trim();

    match input {
        "" => Command::Empty,
        "quit" | "exit" => Command::Quit,
        "/clear" => Command::Clear,
        "/models" => Command::ListModels,
        "/tools" => Command::ListTools,
        "/model" => Command::ModelUsage,
        _ => match input.strip_prefix("/model ") {
            Some(name) if !name.trim().is_empty() => Command::SwitchModel(name.trim().to_string()),
            Some(_) => Command::ModelUsage,
            None => Command::Chat(input.to_string()),
        },
    }
}
