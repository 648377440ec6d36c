use crate::{Clause, Value, separated_by, strip_parameter_sigil};

/// `(column, value)` pairs and how they combine.
pub type Predicate<'a, 'v> = (&'a [(&'v str, &'v Value)], Clause);

/// Renders the statements the data context issues.
///
/// Dialects override [`SqlWriter::write_identifier_quoted`] and
/// [`SqlWriter::parameter_prefix`]; everything else is shared.
pub trait SqlWriter: Send + Sync {
    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(out, value, '"', r#""""#);
        out.push('"');
    }

    /// Sigil of named parameters.
    fn parameter_prefix(&self) -> char {
        '@'
    }

    /// Bound name of the parameter `name`, sigil included.
    fn parameter_name(&self, name: &str) -> String {
        let name = strip_parameter_sigil(name);
        let mut out = String::with_capacity(name.len() + 1);
        self.write_parameter(&mut out, name);
        out
    }

    /// Writes the parameter `label`, one of [`parameter_labels`].
    fn write_parameter(&self, out: &mut String, label: &str) {
        out.push(self.parameter_prefix());
        out.push_str(label);
    }

    fn write_predicate(&self, out: &mut String, entries: &[(&str, &Value)], clause: Clause) {
        if entries.is_empty() || clause == Clause::Never {
            out.push_str("0 = 1");
            return;
        }
        let separator = match clause {
            Clause::Or => " OR ",
            Clause::In => ", ",
            _ => " AND ",
        };
        let labels = parameter_labels(entries.iter().map(|(column, _)| *column));
        separated_by(
            out,
            entries.iter().zip(&labels),
            |out, ((column, _), label)| {
                self.write_identifier_quoted(out, column);
                if clause == Clause::In {
                    out.push_str(" IN (");
                    self.write_parameter(out, label);
                    out.push(')');
                } else {
                    out.push_str(" = ");
                    self.write_parameter(out, label);
                }
            },
            separator,
        );
    }

    fn write_select(&self, out: &mut String, table: &str, predicate: Option<Predicate>) {
        out.push_str("SELECT * FROM ");
        self.write_identifier_quoted(out, table);
        if let Some((entries, clause)) = predicate {
            out.push_str(" WHERE ");
            self.write_predicate(out, entries, clause);
        }
        out.push(';');
    }

    /// `INSERT` binding one parameter per column.
    fn write_insert(&self, out: &mut String, table: &str, columns: &[&str]) {
        out.push_str("INSERT INTO ");
        self.write_identifier_quoted(out, table);
        if columns.is_empty() {
            out.push_str(" DEFAULT VALUES;");
            return;
        }
        out.push_str(" (");
        separated_by(
            out,
            columns,
            |out, v| self.write_identifier_quoted(out, v),
            ", ",
        );
        out.push_str(") VALUES (");
        separated_by(
            out,
            parameter_labels(columns.iter().copied()),
            |out, v| self.write_parameter(out, &v),
            ", ",
        );
        out.push_str(");");
    }

    fn write_update(&self, out: &mut String, table: &str, columns: &[&str], primary_key: &str) {
        out.push_str("UPDATE ");
        self.write_identifier_quoted(out, table);
        out.push_str(" SET ");
        let mut labels = parameter_labels(columns.iter().chain([&primary_key]).copied());
        let key_label = labels.pop().unwrap_or_default();
        separated_by(
            out,
            columns.iter().zip(&labels),
            |out, (column, label)| {
                self.write_identifier_quoted(out, column);
                out.push_str(" = ");
                self.write_parameter(out, label);
            },
            ", ",
        );
        out.push_str(" WHERE ");
        self.write_identifier_quoted(out, primary_key);
        out.push_str(" = ");
        self.write_parameter(out, &key_label);
        out.push(';');
    }

    fn write_delete(&self, out: &mut String, table: &str, predicate: Option<Predicate>) {
        out.push_str("DELETE FROM ");
        self.write_identifier_quoted(out, table);
        if let Some((entries, clause)) = predicate {
            out.push_str(" WHERE ");
            self.write_predicate(out, entries, clause);
        }
        out.push(';');
    }

    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("BEGIN;");
    }

    fn write_transaction_commit(&self, out: &mut String) {
        out.push_str("COMMIT;");
    }

    fn write_transaction_rollback(&self, out: &mut String) {
        out.push_str("ROLLBACK;");
    }
}

/// Parameter labels of the generated statements, one per column in order and
/// without sigil.
///
/// Characters other than ASCII letters, digits and `_` become `_`, a label
/// starting with a digit or left empty gets a `p` in front, and a label
/// already taken gets a numeric suffix. The result is always a plain
/// identifier, whatever the column name.
pub fn parameter_labels<'a>(columns: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for column in columns {
        let mut label = column
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect::<String>();
        if label.is_empty() || label.starts_with(|c: char| c.is_ascii_digit()) {
            label.insert(0, 'p');
        }
        if labels.contains(&label) {
            let mut suffix = 2;
            while labels.iter().any(|v| *v == format!("{label}_{suffix}")) {
                suffix += 1;
            }
            label = format!("{label}_{suffix}");
        }
        labels.push(label);
    }
    labels
}

/// Writer with unquoted identifiers, used for dialect neutral predicate text.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter;

impl GenericSqlWriter {
    pub fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for GenericSqlWriter {
    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push_str(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Quoting;
    impl SqlWriter for Quoting {}

    struct Colon;
    impl SqlWriter for Colon {
        fn parameter_prefix(&self) -> char {
            ':'
        }
    }

    #[test]
    fn quoted_statements() {
        let writer = Quoting;
        let id = Value::Int32(Some(1));
        let entries = [("Id", &id)];
        let mut out = String::new();
        writer.write_select(&mut out, "users", Some((&entries[..], Clause::And)));
        assert_eq!(out, r#"SELECT * FROM "users" WHERE "Id" = @Id;"#);

        out.clear();
        writer.write_insert(&mut out, "users", &["Id", "Name"]);
        assert_eq!(out, r#"INSERT INTO "users" ("Id", "Name") VALUES (@Id, @Name);"#);

        out.clear();
        writer.write_update(&mut out, "users", &["Name", "Age"], "Id");
        assert_eq!(
            out,
            r#"UPDATE "users" SET "Name" = @Name, "Age" = @Age WHERE "Id" = @Id;"#
        );

        out.clear();
        writer.write_delete(&mut out, "users", None);
        assert_eq!(out, r#"DELETE FROM "users";"#);

        out.clear();
        writer.write_insert(&mut out, "users", &[]);
        assert_eq!(out, r#"INSERT INTO "users" DEFAULT VALUES;"#);
    }

    #[test]
    fn escapes_identifiers() {
        let mut out = String::new();
        Quoting.write_identifier_quoted(&mut out, r#"we"ird"#);
        assert_eq!(out, r#""we""ird""#);
    }

    #[test]
    fn labels_are_identifiers() {
        assert_eq!(
            parameter_labels(["id", "first name", "first_name", "2nd", "", "id OR 1=1"]),
            ["id", "first_name", "first_name_2", "p2nd", "p", "id_OR_1_1"]
        );
        let writer = Quoting;
        let mut out = String::new();
        writer.write_insert(&mut out, "people", &["id", "first name"]);
        assert_eq!(
            out,
            r#"INSERT INTO "people" ("id", "first name") VALUES (@id, @first_name);"#
        );

        out.clear();
        writer.write_update(&mut out, "people", &["first name", "first_name"], "first name");
        assert_eq!(
            out,
            r#"UPDATE "people" SET "first name" = @first_name, "first_name" = @first_name_2 WHERE "first name" = @first_name_3;"#
        );

        out.clear();
        let value = Value::Int32(Some(1));
        let entries = [("a\"b", &value), ("a-b", &value)];
        writer.write_predicate(&mut out, &entries, Clause::Or);
        assert_eq!(out, r#""a""b" = @a_b OR "a-b" = @a_b_2"#);
    }

    #[test]
    fn parameter_prefix() {
        let writer = Colon;
        assert_eq!(writer.parameter_name("@Id"), ":Id");
        let mut out = String::new();
        let entries: &[(&str, &Value)] = &[];
        writer.write_delete(&mut out, "t", Some((entries, Clause::And)));
        assert_eq!(out, r#"DELETE FROM "t" WHERE 0 = 1;"#);
        assert_eq!(GenericSqlWriter.parameter_name("Id"), "@Id");
    }
}
