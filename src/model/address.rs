//! Address fields (RFC 5322 §3.4): mailboxes and groups.
//!
//! Parsing is lenient. Anything that does not look like an address is kept
//! verbatim in `address` so no header content is lost from the archive.

/// One mailbox.
///
/// # Examples
/// - `"Juan García <juan@ejemplo.com>"` → `display_name = "Juan García"`, `address = "juan@ejemplo.com"`
/// - `"user@example.com (User)"` → `display_name = "User"`, `address = "user@example.com"`
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct EmailAddress {
    /// Human-readable display name (may be empty).
    pub display_name: String,
    /// The bare address (`user@domain`).
    pub address: String,
}

/// An entry of an address list: a single mailbox or a named group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressEntry {
    Mailbox(EmailAddress),
    Group {
        name: String,
        members: Vec<EmailAddress>,
    },
}

impl EmailAddress {
    /// Parse one mailbox from a (decoded) header fragment.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        // "Display Name <address>" or "<address>"
        if let (Some(open), Some(close)) = (trimmed.rfind('<'), trimmed.rfind('>')) {
            if close > open {
                return Self {
                    display_name: strip_quotes(&trimmed[..open]),
                    address: trimmed[open + 1..close].trim().to_string(),
                };
            }
        }

        // Old style "address (Display Name)"
        if let (Some(open), true) = (trimmed.find('('), trimmed.ends_with(')')) {
            let addr = trimmed[..open].trim();
            if addr.contains('@') {
                return Self {
                    display_name: trimmed[open + 1..trimmed.len() - 1].trim().to_string(),
                    address: addr.to_string(),
                };
            }
        }

        Self {
            display_name: String::new(),
            address: trimmed.to_string(),
        }
    }

    /// Comma-separated mailboxes, ignoring group syntax.
    pub fn parse_list(raw: &str) -> Vec<Self> {
        parse_address_list(raw)
            .into_iter()
            .flat_map(|entry| match entry {
                AddressEntry::Mailbox(m) => vec![m],
                AddressEntry::Group { members, .. } => members,
            })
            .collect()
    }

    /// `"Display Name <address>"` or just `"address"`.
    pub fn display(&self) -> String {
        if self.display_name.is_empty() {
            self.address.clone()
        } else {
            format!("{} <{}>", self.display_name, self.address)
        }
    }

    /// Case-insensitive address comparison, used for owner detection.
    pub fn same_address(&self, other: &str) -> bool {
        !self.address.is_empty() && self.address.eq_ignore_ascii_case(other.trim())
    }
}

impl AddressEntry {
    pub fn mailboxes(&self) -> Box<dyn Iterator<Item = &EmailAddress> + '_> {
        match self {
            Self::Mailbox(m) => Box::new(std::iter::once(m)),
            Self::Group { members, .. } => Box::new(members.iter()),
        }
    }
}

/// Parse a full address list, honouring quoted strings, angle brackets,
/// comments and `name: a, b;` groups.
pub fn parse_address_list(raw: &str) -> Vec<AddressEntry> {
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut group: OpenGroup = None;
    let mut in_quotes = false;
    let mut in_angle = false;
    let mut paren_depth = 0u32;

    for ch in raw.chars() {
        if in_quotes {
            if ch == '"' {
                in_quotes = false;
            }
            current.push(ch);
            continue;
        }
        match ch {
            '"' => {
                in_quotes = true;
                current.push(ch);
            }
            '(' => {
                paren_depth += 1;
                current.push(ch);
            }
            ')' => {
                paren_depth = paren_depth.saturating_sub(1);
                current.push(ch);
            }
            '<' if paren_depth == 0 => {
                in_angle = true;
                current.push(ch);
            }
            '>' if paren_depth == 0 => {
                in_angle = false;
                current.push(ch);
            }
            ':' if paren_depth == 0 && !in_angle && group.is_none() => {
                group = Some((strip_quotes(&current), Vec::new()));
                current.clear();
            }
            ';' if paren_depth == 0 && !in_angle && group.is_some() => {
                flush(&mut entries, &mut current, &mut group);
                if let Some((name, members)) = group.take() {
                    entries.push(AddressEntry::Group { name, members });
                }
            }
            ',' if paren_depth == 0 && !in_angle => flush(&mut entries, &mut current, &mut group),
            _ => current.push(ch),
        }
    }

    flush(&mut entries, &mut current, &mut group);
    if let Some((name, members)) = group.take() {
        // Unterminated group: keep what we have.
        entries.push(AddressEntry::Group { name, members });
    }
    entries
}

type OpenGroup = Option<(String, Vec<EmailAddress>)>;

fn flush(entries: &mut Vec<AddressEntry>, text: &mut String, group: &mut OpenGroup) {
    if !text.trim().is_empty() {
        let addr = EmailAddress::parse(text);
        match group {
            Some((_, members)) => members.push(addr),
            None => entries.push(AddressEntry::Mailbox(addr)),
        }
    }
    text.clear();
}

/// Split the owner address string of an account (`,`, `;` or whitespace).
pub fn split_owner_addresses(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Strip surrounding double-quotes and trim whitespace.
fn strip_quotes(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
