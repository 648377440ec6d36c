use quarry_core::SqlWriter;

pub struct SqliteSqlWriter {}

impl SqlWriter for SqliteSqlWriter {
    /// Takes the write lock when the transaction starts.
    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("BEGIN IMMEDIATE;");
    }
}
