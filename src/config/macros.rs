/// Declare a configuration section with its defaults in one place
///
/// Each field is written as `name: Type = default`. The macro generates the
/// struct with public fields, a `Default` impl built from the declared
/// values, serde support with `#[serde(default)]` (so partial TOML files
/// are valid), and a `FIELDS` list of accepted keys that the loader uses to
/// flag misspelled settings.
///
/// # Example
/// ```
/// dashsync::config_struct! {
///     pub struct RetryConfig {
///         max_attempts: u32 = 3,
///         base_delay_secs: u64 = 5,
///     }
/// }
///
/// let retry = RetryConfig::default();
/// assert_eq!(retry.max_attempts, 3);
/// assert_eq!(RetryConfig::FIELDS, &["max_attempts", "base_delay_secs"]);
/// ```
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl $name {
            /// Keys accepted for this section
            pub const FIELDS: &'static [&'static str] = &[$(stringify!($field_name)),*];
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $($field_name: $default_value,)*
                }
            }
        }
    };
}
