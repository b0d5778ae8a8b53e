//! `rcs-activity` — what elements ask for, and how requests are matched.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                     |
//! |----------------|--------------------------------------------------------------|
//! | [`work_group`] | `WorkGroup`, `ActivityWorkGroup`, `Condition`                |
//! | [`activity`]   | `Activity` (priority-ordered work groups, feasibility flag)  |
//! | [`work_item`]  | `WorkItem` — one element's attempt at one activity           |
//! | [`matcher`]    | `ResourceView` trait, `find_solution` (branch and bound)     |
//! | [`flow`]       | `FlowLayer` trait, `FlowIntent`, `FlowContext`, `NoopFlow`   |
//! | [`error`]      | `ActivityError`, `ActivityResult<T>`                         |
//!
//! # Matching in one paragraph
//!
//! An activity lists alternative work groups, highest priority first.  For
//! each admissible group the matcher searches depth-first for one distinct
//! available resource per required unit, taking candidates in roster order.
//! The first group with a complete assignment wins.  If none has one, the
//! activity is flagged infeasible until a resource changes state.

pub mod activity;
pub mod error;
pub mod flow;
pub mod matcher;
pub mod work_group;
pub mod work_item;


pub use activity::Activity;
pub use error::{ActivityError, ActivityResult};
pub use flow::{FlowContext, FlowIntent, FlowLayer, NoopFlow};
pub use matcher::{find_solution, solve_work_group, Assignment, ResourceView, Solution};
pub use work_group::{ActivityWorkGroup, Condition, WorkGroup};
pub use work_item::WorkItem;
