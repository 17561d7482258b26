//! Permission Definitions
//!
//! Simplified RBAC permission system.
//!
//! ## 设计原则
//! - 查看订单和厨房看板无需权限，登录即可使用
//! - 角色提供默认权限，令牌可以额外授予权限
//! - 敏感操作（作废、退款）单独控制

/// 开单、加菜、改菜
pub const ORDERS_CREATE: &str = "orders:create";
/// 结账收款
pub const ORDERS_SETTLE: &str = "orders:settle";
/// 作废任意订单（创建者本人可取消自己的订单）
pub const ORDERS_VOID: &str = "orders:void";
/// 退款
pub const ORDERS_REFUND: &str = "orders:refund";
/// 推进厨房状态
pub const KITCHEN_ADVANCE: &str = "kitchen:advance";
/// 桌台管理
pub const TABLES_MANAGE: &str = "tables:manage";
/// 菜单同步
pub const MENU_MANAGE: &str = "menu:manage";

/// 可配置权限列表
/// 不包含 "all"，这是系统级权限
pub const ALL_PERMISSIONS: &[&str] = &[
    ORDERS_CREATE,
    ORDERS_SETTLE,
    ORDERS_VOID,
    ORDERS_REFUND,
    KITCHEN_ADVANCE,
    TABLES_MANAGE,
    MENU_MANAGE,
];

/// Default role permissions
pub const DEFAULT_ADMIN_PERMISSIONS: &[&str] = &["all"];

/// 经理角色默认权限（全部可配置权限）
pub const DEFAULT_MANAGER_PERMISSIONS: &[&str] = ALL_PERMISSIONS;

pub const DEFAULT_CASHIER_PERMISSIONS: &[&str] = &[ORDERS_CREATE, ORDERS_SETTLE];

pub const DEFAULT_WAITER_PERMISSIONS: &[&str] = &[ORDERS_CREATE];

/// 厨师 / 厨房看板账号
pub const DEFAULT_KITCHEN_PERMISSIONS: &[&str] = &[KITCHEN_ADVANCE];

/// Get permissions for a role name
pub fn get_default_permissions(role_name: &str) -> Vec<String> {
    let defaults = match role_name {
        "admin" => DEFAULT_ADMIN_PERMISSIONS,
        "manager" => DEFAULT_MANAGER_PERMISSIONS,
        "cashier" => DEFAULT_CASHIER_PERMISSIONS,
        "waiter" => DEFAULT_WAITER_PERMISSIONS,
        "chef" | "kitchen" => DEFAULT_KITCHEN_PERMISSIONS,
        _ => &[],
    };
    defaults.iter().map(|s| s.to_string()).collect()
}
