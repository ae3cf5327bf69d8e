//! In-memory user list behind the mock server.
//!
//! Everything lives for the lifetime of the process. Each operation takes the
//! lock once and releases it before returning.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeZone, Utc};
use log::{debug, info};
use serde_json::Value;

use super::types::{ListParams, LoginRequest};
use crate::api_client::envelope::PageBody;
use crate::error_handling::types::DirectoryError;
use crate::models::{
    BatchDeleteResult, NewUser, PasswordReset, Role, RoleStats, StatusChange, User, UserStats,
    UserStatus, UserUpdate,
};

struct DirectoryState {
    users: Vec<User>,
    next_id: u64,
}

/// The mock server's user store.
pub struct UserDirectory {
    state: Mutex<DirectoryState>,
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl UserDirectory {
    pub fn new(users: Vec<User>) -> Self {
        let next_id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        Self {
            state: Mutex::new(DirectoryState { users, next_id }),
        }
    }

    /// A directory holding one admin, one teacher and one student account.
    pub fn with_demo_users() -> Self {
        Self::new(demo_users())
    }

    pub fn len(&self) -> usize {
        self.lock().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Filters, then pages. `search` matches username, real name and email
    /// case-insensitively; `role` and `status` must match exactly.
    pub fn list(&self, params: &ListParams) -> PageBody<User> {
        let state = self.lock();
        let needle = params.search.as_deref().map(str::to_lowercase);

        let matching: Vec<&User> = state
            .users
            .iter()
            .filter(|u| match &needle {
                Some(needle) => {
                    u.username.to_lowercase().contains(needle)
                        || u.real_name.to_lowercase().contains(needle)
                        || u.email.to_lowercase().contains(needle)
                }
                None => true,
            })
            .filter(|u| params.role.as_deref().map_or(true, |r| u.role.as_str() == r))
            .filter(|u| {
                params
                    .status
                    .as_deref()
                    .map_or(true, |s| u.status.as_str() == s)
            })
            .collect();

        let total = matching.len() as u64;
        let skip = (params.page as usize - 1).saturating_mul(params.size as usize);
        let list = matching
            .into_iter()
            .skip(skip)
            .take(params.size as usize)
            .cloned()
            .collect();
        PageBody::new(list, total, params.page, params.size)
    }

    pub fn get(&self, id: u64) -> Result<User, DirectoryError> {
        self.lock()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(DirectoryError::UserNotFound)
    }

    pub fn find_by_username(&self, username: &str) -> Option<User> {
        self.lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }

    pub fn create(&self, new_user: NewUser) -> Result<User, DirectoryError> {
        let (Some(username), Some(real_name), Some(email), Some(_password), Some(role)) = (
            non_empty(new_user.username),
            non_empty(new_user.real_name),
            non_empty(new_user.email),
            non_empty(new_user.password),
            non_empty(new_user.role),
        ) else {
            return Err(DirectoryError::MissingFields);
        };
        let role: Role = role.parse().map_err(|_| DirectoryError::InvalidRole(role))?;

        let mut state = self.lock();
        if state.users.iter().any(|u| u.username == username) {
            return Err(DirectoryError::UsernameTaken);
        }
        if state.users.iter().any(|u| u.email == email) {
            return Err(DirectoryError::EmailTaken);
        }

        let user = User {
            id: state.next_id,
            username,
            real_name,
            email,
            role,
            status: UserStatus::Active,
            create_time: Utc::now(),
            last_login: None,
            phone: new_user.phone.unwrap_or_default(),
            department: new_user.department.unwrap_or_default(),
            student_id: new_user.student_id,
            update_time: None,
        };
        state.next_id += 1;
        state.users.push(user.clone());
        info!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Applies the fields present in `update`. Empty `realName`, `email` and
    /// `role` are ignored; `phone`, `department` and `studentId` may be cleared.
    pub fn update(&self, id: u64, update: UserUpdate) -> Result<User, DirectoryError> {
        let role = match non_empty(update.role) {
            Some(role) => Some(
                role.parse::<Role>()
                    .map_err(|_| DirectoryError::InvalidRole(role))?,
            ),
            None => None,
        };
        let email = non_empty(update.email);

        let mut state = self.lock();
        if let Some(email) = &email {
            if state.users.iter().any(|u| &u.email == email && u.id != id) {
                return Err(DirectoryError::EmailInUse);
            }
        }
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(DirectoryError::UserNotFound)?;

        if let Some(real_name) = non_empty(update.real_name) {
            user.real_name = real_name;
        }
        if let Some(email) = email {
            user.email = email;
        }
        if let Some(role) = role {
            user.role = role;
        }
        if let Some(phone) = update.phone {
            user.phone = phone;
        }
        if let Some(department) = update.department {
            user.department = department;
        }
        if let Some(student_id) = update.student_id {
            user.student_id = Some(student_id);
        }
        user.update_time = Some(Utc::now());
        debug!("Updated user {}", id);
        Ok(user.clone())
    }

    pub fn delete(&self, id: u64) -> Result<(), DirectoryError> {
        let mut state = self.lock();
        let index = state
            .users
            .iter()
            .position(|u| u.id == id)
            .ok_or(DirectoryError::UserNotFound)?;
        let removed = state.users.remove(index);
        info!("Deleted user {} ({})", removed.username, id);
        Ok(())
    }

    pub fn set_status(&self, id: u64, status: Option<&str>) -> Result<StatusChange, DirectoryError> {
        let status: UserStatus = status
            .and_then(|s| s.parse().ok())
            .ok_or(DirectoryError::InvalidStatus)?;

        let mut state = self.lock();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(DirectoryError::UserNotFound)?;
        let now = Utc::now();
        user.status = status;
        user.update_time = Some(now);
        Ok(StatusChange {
            id,
            status,
            update_time: now,
        })
    }

    /// Nothing is stored for passwords; this only confirms the user exists.
    pub fn reset_password(&self, id: u64) -> Result<PasswordReset, DirectoryError> {
        let user = self.get(id)?;
        info!("Password reset requested for {}", user.username);
        Ok(PasswordReset {
            id,
            reset_time: Utc::now(),
        })
    }

    /// Removes every user whose id appears in `user_ids`, which must be a JSON
    /// array. Non-numeric entries match nothing.
    pub fn batch_delete(&self, user_ids: Option<&Value>) -> Result<BatchDeleteResult, DirectoryError> {
        let Some(Value::Array(raw_ids)) = user_ids else {
            return Err(DirectoryError::InvalidIdList);
        };
        let wanted: HashSet<u64> = raw_ids.iter().filter_map(Value::as_u64).collect();

        let mut state = self.lock();
        let mut deleted_ids = Vec::new();
        state.users.retain(|u| {
            if wanted.contains(&u.id) {
                deleted_ids.push(u.id);
                false
            } else {
                true
            }
        });
        info!("Batch deleted {} user(s)", deleted_ids.len());
        Ok(BatchDeleteResult {
            deleted_count: deleted_ids.len(),
            deleted_ids,
        })
    }

    pub fn stats(&self) -> UserStats {
        let state = self.lock();
        let mut stats = UserStats {
            total_users: state.users.len(),
            ..Default::default()
        };
        let mut departments = BTreeMap::new();

        for user in &state.users {
            match user.status {
                UserStatus::Active => stats.active_users += 1,
                UserStatus::Inactive => stats.inactive_users += 1,
            }
            match user.role {
                Role::Admin => stats.role_stats.admin += 1,
                Role::Teacher => stats.role_stats.teacher += 1,
                Role::Student => stats.role_stats.student += 1,
            }
            if !user.department.is_empty() {
                *departments.entry(user.department.clone()).or_insert(0) += 1;
            }
        }
        stats.department_stats = departments;
        stats
    }

    /// Checks a login attempt and stamps `lastLogin` on success.
    ///
    /// No passwords are stored, so any non-empty password is accepted.
    pub fn login(&self, request: &LoginRequest) -> Result<User, DirectoryError> {
        let (Some(username), Some(_), Some(role)) = (
            request.username.as_deref().filter(|s| !s.is_empty()),
            request.password.as_deref().filter(|s| !s.is_empty()),
            request.role.as_deref().filter(|s| !s.is_empty()),
        ) else {
            return Err(DirectoryError::MissingFields);
        };

        let mut state = self.lock();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.username == username)
            .ok_or(DirectoryError::BadCredentials)?;
        if user.status == UserStatus::Inactive {
            return Err(DirectoryError::AccountDisabled);
        }
        if user.role.as_str() != role {
            return Err(DirectoryError::RoleMismatch);
        }
        user.last_login = Some(Utc::now());
        Ok(user.clone())
    }

    fn lock(&self) -> MutexGuard<'_, DirectoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .unwrap_or_default()
}

fn demo_users() -> Vec<User> {
    vec![
        User {
            id: 1,
            username: "admin".to_string(),
            real_name: "系统管理员".to_string(),
            email: "admin@yunmeng.edu.cn".to_string(),
            role: Role::Admin,
            status: UserStatus::Active,
            create_time: at(2024, 1, 1, 0, 0),
            last_login: Some(at(2024, 1, 15, 14, 30)),
            phone: "13800138000".to_string(),
            department: "信息技术部".to_string(),
            student_id: None,
            update_time: None,
        },
        User {
            id: 2,
            username: "teacher001".to_string(),
            real_name: "李老师".to_string(),
            email: "li.teacher@yunmeng.edu.cn".to_string(),
            role: Role::Teacher,
            status: UserStatus::Active,
            create_time: at(2024, 1, 2, 10, 0),
            last_login: Some(at(2024, 1, 15, 13, 45)),
            phone: "13800138001".to_string(),
            department: "计算机学院".to_string(),
            student_id: None,
            update_time: None,
        },
        User {
            id: 3,
            username: "student001".to_string(),
            real_name: "张三".to_string(),
            email: "zhangsan@yunmeng.edu.cn".to_string(),
            role: Role::Student,
            status: UserStatus::Active,
            create_time: at(2024, 1, 3, 14, 20),
            last_login: Some(at(2024, 1, 15, 12, 20)),
            phone: "13800138002".to_string(),
            department: "计算机学院".to_string(),
            student_id: Some("2021001".to_string()),
            update_time: None,
        },
    ]
}
