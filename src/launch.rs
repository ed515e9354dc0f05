//! Launch-options overlay state and the argument builder it feeds.

/// Model variants offered by the overlay: display name and model id.
pub const MODELS: [(&str, &str); 4] = [
    ("default", ""),
    ("opus", "claude-opus-4-6"),
    ("sonnet", "claude-sonnet-4-5-20250929"),
    ("haiku", "claude-haiku-4-5-20251001"),
];

pub const MODEL_FLAG: &str = "--model";
pub const VERBOSE_FLAG: &str = "--verbose";
pub const NO_PERMISSIONS_FLAG: &str = "--dangerously-skip-permissions";
pub const PRINT_FLAG: &str = "--print";

pub const ROW_MODEL: usize = 0;
pub const ROW_VERBOSE: usize = 1;
pub const ROW_NO_PERMISSIONS: usize = 2;
pub const ROW_PRINT: usize = 3;
pub const ROW_CUSTOM: usize = 4;
pub const ROW_LAUNCH: usize = 5;
pub const ROW_COUNT: usize = 6;

pub fn build_args(
    model: &str,
    verbose: bool,
    no_permissions: bool,
    print: bool,
    custom: &str,
) -> Vec<String> {
    let mut args = Vec::new();
    if !model.is_empty() {
        args.push(MODEL_FLAG.to_string());
        args.push(model.to_string());
    }
    for (enabled, flag) in [
        (verbose, VERBOSE_FLAG),
        (no_permissions, NO_PERMISSIONS_FLAG),
        (print, PRINT_FLAG),
    ] {
        if enabled {
            args.push(flag.to_string());
        }
    }
    args.extend(custom.split_whitespace().map(str::to_string));
    args
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    pub model: usize,
    pub verbose: bool,
    pub no_permissions: bool,
    pub print: bool,
    pub custom: String,
    pub editing: bool,
    pub row: usize,
}

impl LaunchOptions {
    pub fn model_name(&self) -> &'static str {
        MODELS[self.model % MODELS.len()].0
    }

    pub fn model_id(&self) -> &'static str {
        MODELS[self.model % MODELS.len()].1
    }

    pub fn row_up(&mut self) {
        self.row = self.row.saturating_sub(1);
    }

    pub fn row_down(&mut self) {
        self.row = (self.row + 1).min(ROW_COUNT - 1);
    }

    /// Cycles the model or flips a flag. Rows past the toggles are untouched.
    pub fn toggle(&mut self) {
        match self.row {
            ROW_MODEL => self.model = (self.model + 1) % MODELS.len(),
            ROW_VERBOSE => self.verbose = !self.verbose,
            ROW_NO_PERMISSIONS => self.no_permissions = !self.no_permissions,
            ROW_PRINT => self.print = !self.print,
            _ => {}
        }
    }

    pub fn args(&self) -> Vec<String> {
        build_args(
            self.model_id(),
            self.verbose,
            self.no_permissions,
            self.print,
            &self.custom,
        )
    }
}
