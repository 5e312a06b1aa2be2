// 校验通过后的新作业，时间为 Unix 秒，pdf 为已存储的文件名
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub name: String,
    pub description: Option<String>,
    pub start_time: i64,
    pub end_time: i64,
    pub late_time: i64,
    pub max_submissions: i32,
    pub grade: f64,
    pub course_id: i64,
    pub group_id: Option<i64>,
    pub pdf: Option<String>,
}
