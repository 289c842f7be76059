/// `:` commands and autocomplete ranking

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// Commands reachable from the `:` palette
pub const COMMANDS: &[Command] = &[
  Command {
    name: "directory",
    aliases: &["d", "dir", "home", "employees"],
    description: "Back to the employee directory",
  },
  Command {
    name: "add",
    aliases: &["a", "new", "create"],
    description: "Add a new employee",
  },
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    description: "Refetch everything on screen",
  },
  Command {
    name: "signout",
    aliases: &["logout", "so"],
    description: "Sign out of TeamHub",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit TeamHub",
  },
];

impl Command {
  /// Match rank for `input` (lower is better), `None` if it doesn't match
  fn rank(&self, input: &str) -> Option<u8> {
    let aliases = || self.aliases.iter();
    if self.name == input {
      Some(0)
    } else if aliases().any(|a| *a == input) {
      Some(1)
    } else if self.name.starts_with(input) {
      Some(2)
    } else if aliases().any(|a| a.starts_with(input)) {
      Some(3)
    } else if self.name.contains(input) {
      Some(4)
    } else if aliases().any(|a| a.contains(input)) {
      Some(5)
    } else {
      None
    }
  }
}

/// Suggestions for the palette, best match first
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input = input.trim().to_lowercase();
  if input.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut ranked: Vec<(u8, &'static Command)> = COMMANDS
    .iter()
    .filter_map(|cmd| cmd.rank(&input).map(|rank| (rank, cmd)))
    .collect();
  // Stable sort keeps declaration order within a rank
  ranked.sort_by_key(|(rank, _)| *rank);
  ranked.into_iter().map(|(_, cmd)| cmd).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn first(input: &str) -> Option<&'static str> {
    get_suggestions(input).first().map(|cmd| cmd.name)
  }

  #[test]
  fn test_empty_input_lists_everything() {
    assert_eq!(get_suggestions("").len(), COMMANDS.len());
  }

  #[test]
  fn test_ranking() {
    assert_eq!(first("add"), Some("add"));
    assert_eq!(first("logout"), Some("signout"));
    assert_eq!(first("ref"), Some("refresh"));
    assert_eq!(first("empl"), Some("directory"));
    assert_eq!(first("OUT"), Some("signout"));
    assert_eq!(first("xyz"), None);
  }

  #[test]
  fn test_exact_alias_beats_name_prefix() {
    let names: Vec<_> = get_suggestions("d").iter().map(|c| c.name).collect();
    assert_eq!(names[0], "directory");
    assert!(names.contains(&"add"));
  }
}
