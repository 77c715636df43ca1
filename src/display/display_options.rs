/// Output rendering options shared by all commands.
#[derive(Debug, Clone)]
pub struct DisplayOptions {
    /// Disable the use of colors
    pub no_color: bool,
    /// Override the detected terminal width
    pub max_width: Option<usize>,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            no_color: false,
            max_width: None,
        }
    }
}

impl DisplayOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_no_color(mut self, no_color: bool) -> Self {
        self.no_color = no_color;
        self
    }

    pub fn with_max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }

    /// Read options from environment variables
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if std::env::var("NO_COLOR").is_ok() {
            options.no_color = true;
        }

        if let Ok(width_str) = std::env::var("SQLR_WIDTH") {
            if let Ok(width) = width_str.parse::<usize>() {
                options.max_width = Some(width);
            }
        }

        options
    }

    /// Colors are used only on a TTY and when not disabled.
    pub fn use_colors(&self) -> bool {
        !self.no_color && atty::is(atty::Stream::Stdout)
    }
}
