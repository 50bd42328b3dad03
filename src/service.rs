// Customer use cases - the operations the HTTP handlers and CLI call
// Parse -> construct -> repository, with typed errors all the way out

use std::sync::Arc;

use crate::db::CustomerRepository;
use crate::entity::Customer;
use crate::error::CustomerError;
use crate::parser::{parse_batch_all, parse_single, NewCustomer};

/// Orchestrates parsing, construction and persistence over any
/// `CustomerRepository` implementation.
#[derive(Clone)]
pub struct CustomerService {
    repo: Arc<dyn CustomerRepository>,
}

impl CustomerService {
    pub fn new(repo: Arc<dyn CustomerRepository>) -> Self {
        CustomerService { repo }
    }

    /// Create one customer from a JSON input. Returns the stored record,
    /// including its assigned id.
    pub fn create(&self, input: &NewCustomer) -> Result<Customer, CustomerError> {
        let fields = parse_single(input);
        let customer = Customer::new(fields)?;
        self.repo.insert(&customer)?;
        Ok(customer)
    }

    /// Create customers in bulk from the text of a fixed-width upload.
    ///
    /// The whole file is parsed and every record constructed before the
    /// first insert, so a short line or structural violation anywhere
    /// inserts nothing. Returns the number of records inserted.
    pub fn create_bulk(&self, file: &str) -> Result<usize, CustomerError> {
        let customers = parse_batch_all(file.lines())?
            .into_iter()
            .map(Customer::new)
            .collect::<Result<Vec<_>, _>>()?;

        self.repo.insert_many(&customers)?;
        Ok(customers.len())
    }

    /// One page of customers, 1-indexed. Page numbers below 1 are clamped.
    pub fn list(&self, page: usize) -> Result<Vec<Customer>, CustomerError> {
        self.repo.page(page)
    }

    pub fn find_by_id(&self, id: &str) -> Result<Customer, CustomerError> {
        self.repo.find_by_id(id)
    }

    pub fn find_by_cpf(&self, cpf: &str) -> Result<Customer, CustomerError> {
        self.repo.find_by_cpf(cpf)
    }

    /// Delete by id. `NotFound` when no such customer exists.
    pub fn delete(&self, id: &str) -> Result<(), CustomerError> {
        let customer = self.repo.find_by_id(id)?;
        self.repo.delete(&customer)
    }
}

// ============================================================================
// TESTS
// ============================================================================
