use drawbridge::config::{
    Config, LogLevel, PANEL_DEFAULT_WIDTH, PANEL_MAX_WIDTH, PANEL_MIN_WIDTH,
};

#[test]
fn test_config_defaults() {
    let config = Config::default();
    assert_eq!(config.window_title, "drawbridge");
    assert_eq!(config.window_width, 1280);
    assert_eq!(config.window_height, 800);
    assert_eq!(config.diagrams_base_url, "https://embed.diagrams.net/");
    assert_eq!(config.chat_endpoint, "https://api.deepseek.com/chat/completions");
    assert_eq!(config.chat_model, "deepseek-chat");
    assert_eq!(config.chat_timeout_secs, 60);
    assert_eq!(config.panel_width, PANEL_DEFAULT_WIDTH);
    assert!(config.panel_open_on_startup);
    assert_eq!(config.log_level, LogLevel::Info);
}

#[test]
fn test_config_new() {
    let config = Config::new();
    assert_eq!(config.panel_width, PANEL_DEFAULT_WIDTH);
}

#[test]
fn test_panel_width_bounds_are_sane() {
    assert!(PANEL_MIN_WIDTH < PANEL_DEFAULT_WIDTH);
    assert!(PANEL_DEFAULT_WIDTH < PANEL_MAX_WIDTH);
}

#[test]
fn test_config_yaml_serialization() {
    let config = Config::default();
    let yaml = serde_yaml_ng::to_string(&config).expect("serialize config");
    assert!(yaml.contains("window_title: drawbridge"));
    assert!(yaml.contains("chat_model: deepseek-chat"));
    assert!(yaml.contains("log_level: info"));

    let back: Config = serde_yaml_ng::from_str(&yaml).expect("deserialize config");
    assert_eq!(back.window_width, config.window_width);
    assert_eq!(back.panel_width, config.panel_width);
}

#[test]
fn test_validate_restores_zero_window_dimensions() {
    let mut config = Config::default();
    config.window_width = 0;
    config.validate();
    assert_eq!(config.window_width, 1280);
}
