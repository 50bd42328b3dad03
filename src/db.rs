// Persistence for customer records
// Repository contract + SQLite implementation + in-memory double for tests

use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};

use crate::entity::{Customer, Identity};
use crate::error::CustomerError;

/// Fixed page size for listing (1-indexed pages)
pub const PAGE_SIZE: usize = 100;

/// Bulk inserts are grouped into transactions of this many rows
pub const INSERT_CHUNK_SIZE: usize = 1000;

// ============================================================================
// REPOSITORY CONTRACT
// ============================================================================

/// Storage collaborator for customer records. Lookup misses surface as
/// `NotFound`; everything else storage-related is `Internal`.
pub trait CustomerRepository: Send + Sync {
    fn insert(&self, customer: &Customer) -> Result<(), CustomerError>;

    /// Insert a batch, grouped in chunks of `INSERT_CHUNK_SIZE`.
    fn insert_many(&self, customers: &[Customer]) -> Result<(), CustomerError>;

    /// Fetch one page of customers ordered by id (creation order).
    /// Pages are 1-indexed and `PAGE_SIZE` rows long.
    fn page(&self, page: usize) -> Result<Vec<Customer>, CustomerError>;

    fn find_by_id(&self, id: &str) -> Result<Customer, CustomerError>;

    fn find_by_cpf(&self, cpf: &str) -> Result<Customer, CustomerError>;

    /// Hard delete - no soft-delete or versioning.
    fn delete(&self, customer: &Customer) -> Result<(), CustomerError>;
}

// ============================================================================
// SQLITE
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<(), CustomerError> {
    // WAL for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS customers (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            cpf TEXT NOT NULL,
            cpf_valido INTEGER NOT NULL,
            private TEXT NOT NULL,
            incompleto TEXT NOT NULL,
            data_ultima_compra TEXT,
            ticket_medio REAL NOT NULL,
            ticket_ultima_compra REAL NOT NULL,
            loja_mais_frequente TEXT NOT NULL,
            cnpj_loja_mais_frequente_valido INTEGER NOT NULL,
            loja_ultima_compra TEXT NOT NULL,
            cnpj_loja_ultima_compra_valido INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_customers_cpf ON customers(cpf)",
        [],
    )?;

    Ok(())
}

/// SQLite-backed repository sharing one connection behind a mutex, so it
/// can serve the API handlers and the CLI alike.
#[derive(Clone)]
pub struct SqliteRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRepository {
    pub fn new(conn: Connection) -> Result<Self, CustomerError> {
        setup_database(&conn)?;
        Ok(SqliteRepository {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

const SELECT_COLUMNS: &str = "id, created_at, cpf, cpf_valido, private, incompleto,
        data_ultima_compra, ticket_medio, ticket_ultima_compra,
        loja_mais_frequente, cnpj_loja_mais_frequente_valido,
        loja_ultima_compra, cnpj_loja_ultima_compra_valido";

fn row_to_customer(row: &Row<'_>) -> rusqlite::Result<Customer> {
    let created_at: String = row.get(1)?;
    let created_at: DateTime<Utc> = created_at
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e)))?;

    let date_text: Option<String> = row.get(6)?;
    let data_ultima_compra = match date_text {
        Some(text) => Some(NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?),
        None => None,
    };

    Ok(Customer {
        identity: Identity {
            id: row.get(0)?,
            created_at,
        },
        cpf: row.get(2)?,
        cpf_valido: row.get(3)?,
        private: row.get(4)?,
        incompleto: row.get(5)?,
        data_ultima_compra,
        ticket_medio: row.get(7)?,
        ticket_ultima_compra: row.get(8)?,
        loja_mais_frequente: row.get(9)?,
        cnpj_loja_mais_frequente_valido: row.get(10)?,
        loja_ultima_compra: row.get(11)?,
        cnpj_loja_ultima_compra_valido: row.get(12)?,
    })
}

fn insert_with(conn: &Connection, customer: &Customer) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO customers (
            id, created_at, cpf, cpf_valido, private, incompleto,
            data_ultima_compra, ticket_medio, ticket_ultima_compra,
            loja_mais_frequente, cnpj_loja_mais_frequente_valido,
            loja_ultima_compra, cnpj_loja_ultima_compra_valido
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            customer.id(),
            customer.created_at().to_rfc3339(),
            customer.cpf,
            customer.cpf_valido,
            customer.private,
            customer.incompleto,
            customer.data_ultima_compra.map(|d| d.to_string()),
            customer.ticket_medio,
            customer.ticket_ultima_compra,
            customer.loja_mais_frequente,
            customer.cnpj_loja_mais_frequente_valido,
            customer.loja_ultima_compra,
            customer.cnpj_loja_ultima_compra_valido,
        ],
    )?;
    Ok(())
}

impl CustomerRepository for SqliteRepository {
    fn insert(&self, customer: &Customer) -> Result<(), CustomerError> {
        let conn = self.conn.lock().unwrap();
        insert_with(&conn, customer)?;
        Ok(())
    }

    fn insert_many(&self, customers: &[Customer]) -> Result<(), CustomerError> {
        let mut conn = self.conn.lock().unwrap();

        for chunk in customers.chunks(INSERT_CHUNK_SIZE) {
            let tx = conn.transaction()?;
            for customer in chunk {
                insert_with(&tx, customer)?;
            }
            tx.commit()?;
        }

        Ok(())
    }

    fn page(&self, page: usize) -> Result<Vec<Customer>, CustomerError> {
        let page = page.max(1);
        let offset = (page - 1) * PAGE_SIZE;

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM customers ORDER BY id LIMIT ?1 OFFSET ?2"
        ))?;

        let customers = stmt
            .query_map(params![PAGE_SIZE, offset], row_to_customer)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(customers)
    }

    fn find_by_id(&self, id: &str) -> Result<Customer, CustomerError> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM customers WHERE id = ?1"),
            params![id],
            row_to_customer,
        );

        match result {
            Ok(customer) => Ok(customer),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(CustomerError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    fn find_by_cpf(&self, cpf: &str) -> Result<Customer, CustomerError> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM customers WHERE cpf = ?1 ORDER BY id LIMIT 1"),
            params![cpf],
            row_to_customer,
        );

        match result {
            Ok(customer) => Ok(customer),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(CustomerError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, customer: &Customer) -> Result<(), CustomerError> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute(
            "DELETE FROM customers WHERE id = ?1",
            params![customer.id()],
        )?;

        if affected == 0 {
            return Err(CustomerError::NotFound);
        }
        Ok(())
    }
}

// ============================================================================
// IN-MEMORY DOUBLE
// ============================================================================

/// In-memory repository implementing the same contract, for tests and
/// wiring without a database file.
#[derive(Default)]
pub struct MemoryRepository {
    customers: Mutex<Vec<Customer>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.customers.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CustomerRepository for MemoryRepository {
    fn insert(&self, customer: &Customer) -> Result<(), CustomerError> {
        self.customers.lock().unwrap().push(customer.clone());
        Ok(())
    }

    fn insert_many(&self, customers: &[Customer]) -> Result<(), CustomerError> {
        self.customers.lock().unwrap().extend_from_slice(customers);
        Ok(())
    }

    fn page(&self, page: usize) -> Result<Vec<Customer>, CustomerError> {
        let page = page.max(1);
        let mut all = self.customers.lock().unwrap().clone();
        all.sort_by(|a, b| a.id().cmp(b.id()));

        Ok(all
            .into_iter()
            .skip((page - 1) * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect())
    }

    fn find_by_id(&self, id: &str) -> Result<Customer, CustomerError> {
        self.customers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id() == id)
            .cloned()
            .ok_or(CustomerError::NotFound)
    }

    fn find_by_cpf(&self, cpf: &str) -> Result<Customer, CustomerError> {
        self.customers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.cpf == cpf)
            .cloned()
            .ok_or(CustomerError::NotFound)
    }

    fn delete(&self, customer: &Customer) -> Result<(), CustomerError> {
        let mut customers = self.customers.lock().unwrap();
        let before = customers.len();
        customers.retain(|c| c.id() != customer.id());

        if customers.len() == before {
            return Err(CustomerError::NotFound);
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
