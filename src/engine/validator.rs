// ==========================================
// 院系课表排课系统 - 课表校验引擎
// ==========================================
// 红线: 纯函数，不改状态、不落库
// 红线: 校验不通过是正常结果（报告），不是错误
// ==========================================
// 职责: 以全校其他课表 + 候选课表为范围检查硬约束/软约束
// 输入: 候选课表 + 其他已保存课表 + 教师/课程目录
// 输出: ValidationReport { is_valid, errors, warnings }
// ==========================================
// 全校范围: 教师重复占用 / 连续理论课 / 理论实验相邻(警告) / 工作量上限
// 仅候选课表: 结构检查 / 教师可排日 / 课程节次数 = credits
// ==========================================

mod core;
mod report;


pub use core::TimetableValidator;
pub use report::{IssueKind, ValidationIssue, ValidationReport};
