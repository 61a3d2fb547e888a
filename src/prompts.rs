pub const REMOVE_BACKGROUND: &str = include_str!("../data/prompts/remove_background.txt");
