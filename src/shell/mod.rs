//! Commands of the interactive shell

use std::fmt;
use std::str::FromStr;

/// One line of shell input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Type into the search bar and show suggestions
    Type(String),
    /// Submit a query from the search bar
    Submit(String),
    /// Select a catalog in the search bar
    Switch(String),
    /// Choose the n-th (1-based) suggestion entry
    Pick(usize),
    /// Toggle a refinement on a panel
    Refine {
        catalog_id: String,
        attribute: String,
        value: String,
    },
    /// Clear a panel's refinements
    Clear(String),
    /// Go to a panel page (1-based)
    Page { catalog_id: String, page: u32 },
    /// Add a displayed hit to the cart
    Cart { catalog_id: String, object_id: String },
    /// Load another URL
    Open(String),
    Show,
    Help,
    Quit,
}

/// Why a line could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCommandError(String);

impl fmt::Display for ParseCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseCommandError {}

fn usage(message: &str) -> ParseCommandError {
    ParseCommandError(format!("usage: {}", message))
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let args: Vec<&str> = rest.split_whitespace().collect();

        match name {
            "type" => Ok(Command::Type(rest.to_string())),
            "submit" => Ok(Command::Submit(rest.to_string())),
            "switch" => match args.as_slice() {
                [id] => Ok(Command::Switch(id.to_string())),
                _ => Err(usage("switch <catalog>")),
            },
            "pick" => args
                .first()
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .map(Command::Pick)
                .ok_or_else(|| usage("pick <n>")),
            "refine" => {
                let mut parts = rest.splitn(3, char::is_whitespace);
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(catalog), Some(attribute), Some(value)) if !catalog.is_empty() => {
                        Ok(Command::Refine {
                            catalog_id: catalog.to_string(),
                            attribute: attribute.to_string(),
                            value: value.trim().to_string(),
                        })
                    }
                    _ => Err(usage("refine <catalog> <attribute> <value>")),
                }
            }
            "clear" => match args.as_slice() {
                [id] => Ok(Command::Clear(id.to_string())),
                _ => Err(usage("clear <catalog>")),
            },
            "page" => match args.as_slice() {
                [id, n] => n
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .map(|page| Command::Page {
                        catalog_id: id.to_string(),
                        page,
                    })
                    .ok_or_else(|| usage("page <catalog> <n>")),
                _ => Err(usage("page <catalog> <n>")),
            },
            "cart" => match args.as_slice() {
                [id, object_id] => Ok(Command::Cart {
                    catalog_id: id.to_string(),
                    object_id: object_id.to_string(),
                }),
                _ => Err(usage("cart <catalog> <objectID>")),
            },
            "open" => match args.as_slice() {
                [url] => Ok(Command::Open(url.to_string())),
                _ => Err(usage("open <url>")),
            },
            "show" => Ok(Command::Show),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            "" => Err(ParseCommandError("empty command".to_string())),
            other => Err(ParseCommandError(format!(
                "unknown command '{}', try 'help'",
                other
            ))),
        }
    }
}

/// Shell help text
pub const HELP: &str = r#"COMMANDS:
    type <text>                          Type into the search bar
    submit <text>                        Submit a query
    switch <catalog>                     Select a catalog
    pick <n>                             Choose the n-th suggestion entry
    refine <catalog> <attribute> <value> Toggle a refinement on a panel
    clear <catalog>                      Clear a panel's refinements
    page <catalog> <n>                   Go to page n of a panel
    cart <catalog> <objectID>            Add a hit to the cart
    open <url>                           Load another page
    show                                 Show the page state
    help                                 Show this help
    quit                                 Exit"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_commands() {
        assert_eq!(
            "type  red shoes ".parse::<Command>(),
            Ok(Command::Type("red shoes".to_string()))
        );
        assert_eq!("submit".parse::<Command>(), Ok(Command::Submit(String::new())));
        assert_eq!(
            "switch expensiveProducts".parse::<Command>(),
            Ok(Command::Switch("expensiveProducts".to_string()))
        );
    }

    #[test]
    fn test_parse_refine_keeps_spaces_in_value() {
        assert_eq!(
            "refine products hierarchicalCategories.lvl0 TV & Home Theater".parse::<Command>(),
            Ok(Command::Refine {
                catalog_id: "products".to_string(),
                attribute: "hierarchicalCategories.lvl0".to_string(),
                value: "TV & Home Theater".to_string(),
            })
        );
        assert!("refine products brand".parse::<Command>().is_err());
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!("pick 2".parse::<Command>(), Ok(Command::Pick(2)));
        assert!("pick 0".parse::<Command>().is_err());
        assert!("pick x".parse::<Command>().is_err());
        assert_eq!(
            "page products 3".parse::<Command>(),
            Ok(Command::Page {
                catalog_id: "products".to_string(),
                page: 3
            })
        );
        assert!("page products".parse::<Command>().is_err());
    }

    #[test]
    fn test_parse_unknown() {
        let err = "dance".parse::<Command>().unwrap_err();
        assert!(err.to_string().contains("unknown command"));
        assert!("".parse::<Command>().is_err());
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));
    }
}
