use std::path::PathBuf;

pub trait Configuration: Clone + Send + Sync + 'static {
    fn website_title(&self) -> String;
    fn port(&self) -> String;
    fn frontend_path(&self) -> PathBuf;
    fn api_base_url(&self) -> Option<String>;
}
