// Chart-of-accounts tree
//
// Built once per request from the flat account list. Nodes live in an arena
// and refer to each other by index; the tree is read-only after `build`.
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{AccountingError, AccountingResult, StructuralError};
use crate::models::Account;

/// Immediate parent code (`2.1.9.01` → `2.1.9`), `None` for roots
pub fn parent_code(code: &str) -> Option<&str> {
    code.rsplit_once('.').map(|(parent, _)| parent)
}

/// `code` equals `scope` or sits below it
pub fn is_within(code: &str, scope: &str) -> bool {
    code.strip_prefix(scope)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}

/// Hierarchical order: numeric segments compare as numbers, so `1.2` < `1.10`
pub fn compare_codes(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ordering = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(m), Ok(n)) => m.cmp(&n),
                    _ => x.cmp(y),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

fn depth(code: &str) -> usize {
    code.split('.').count()
}

fn is_valid_code(code: &str) -> bool {
    !code.is_empty()
        && code
            .split('.')
            .all(|segment| !segment.is_empty() && segment.chars().all(char::is_alphanumeric))
}

#[derive(Debug)]
struct Node {
    account: Account,
    depth: usize,
    children: Vec<usize>,
}

#[derive(Debug)]
pub struct ChartOfAccounts {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    roots: Vec<usize>,
}

impl ChartOfAccounts {
    /// Build the tree from a flat list in any order.
    ///
    /// # Errors
    ///
    /// [`StructuralError`] for malformed or duplicated codes, a missing
    /// parent, an analytic parent or a child whose type differs from its
    /// parent's.
    pub fn build(mut accounts: Vec<Account>) -> Result<Self, StructuralError> {
        if let Some(bad) = accounts.iter().find(|a| !is_valid_code(&a.code)) {
            return Err(StructuralError::InvalidCode {
                code: bad.code.clone(),
            });
        }

        accounts.sort_by(|a, b| {
            depth(&a.code)
                .cmp(&depth(&b.code))
                .then_with(|| compare_codes(&a.code, &b.code))
        });

        let mut nodes: Vec<Node> = Vec::with_capacity(accounts.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(accounts.len());
        let mut roots = Vec::new();

        for account in accounts {
            if index.contains_key(&account.code) {
                return Err(StructuralError::CodeCollision { code: account.code });
            }
            let id = nodes.len();

            match parent_code(&account.code) {
                None => roots.push(id),
                Some(parent) => {
                    let parent_node = index
                        .get(parent)
                        .and_then(|&pid| nodes.get_mut(pid))
                        .ok_or_else(|| StructuralError::OrphanedAccount {
                            code: account.code.clone(),
                            parent: parent.to_string(),
                        })?;
                    if !parent_node.account.is_synthetic {
                        return Err(StructuralError::ParentNotSynthetic {
                            code: account.code.clone(),
                            parent: parent.to_string(),
                        });
                    }
                    if parent_node.account.account_type != account.account_type {
                        return Err(StructuralError::TypeMismatch {
                            code: account.code.clone(),
                            child_type: account.account_type.as_str(),
                            parent: parent.to_string(),
                            parent_type: parent_node.account.account_type.as_str(),
                        });
                    }
                    parent_node.children.push(id);
                }
            }

            index.insert(account.code.clone(), id);
            nodes.push(Node {
                depth: depth(&account.code),
                account,
                children: Vec::new(),
            });
        }

        Ok(Self {
            nodes,
            index,
            roots,
        })
    }

    pub fn get(&self, code: &str) -> Option<&Account> {
        self.index
            .get(code)
            .and_then(|&id| self.nodes.get(id))
            .map(|node| &node.account)
    }

    /// # Errors
    ///
    /// [`AccountingError::NotFound`] for an unknown code.
    pub fn require(&self, code: &str) -> AccountingResult<&Account> {
        self.get(code).ok_or_else(|| AccountingError::not_found(code))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    /// Known, postable leaf account
    pub fn is_analytic(&self, code: &str) -> bool {
        self.get(code).is_some_and(|account| !account.is_synthetic)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Analytic accounts under `code` at any depth, in code order.
    ///
    /// An analytic `code` yields itself.
    ///
    /// # Errors
    ///
    /// [`AccountingError::NotFound`] for an unknown code and
    /// [`StructuralError::EmptySynthetic`] when a synthetic node has no
    /// analytic account beneath it.
    pub fn descendants(&self, code: &str) -> AccountingResult<Vec<&Account>> {
        let root = *self
            .index
            .get(code)
            .ok_or_else(|| AccountingError::not_found(code))?;

        let mut leaves = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if !node.account.is_synthetic {
                leaves.push(&node.account);
            }
            // reversed so the pop order follows code order
            stack.extend(node.children.iter().rev());
        }

        if leaves.is_empty() {
            return Err(StructuralError::EmptySynthetic {
                code: code.to_string(),
            }
            .into());
        }
        Ok(leaves)
    }

    /// Known ancestors of `code`, nearest first. `code` itself need not exist.
    pub fn ancestors(&self, code: &str) -> Vec<&Account> {
        let mut found = Vec::new();
        let mut current = parent_code(code);
        while let Some(parent) = current {
            if let Some(account) = self.get(parent) {
                found.push(account);
            }
            current = parent_code(parent);
        }
        found
    }

    /// Every account in code order (pre-order) with its depth, roots at 1
    pub fn walk(&self) -> Vec<(usize, &Account)> {
        let mut ordered = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            ordered.push((node.depth, &node.account));
            stack.extend(node.children.iter().rev());
        }
        ordered
    }
}
