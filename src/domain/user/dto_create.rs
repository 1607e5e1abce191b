#[derive(Debug, Clone)]
pub struct CreateUserDto {
    pub email: String,
    pub name: Option<String>,
    pub password: String,
}
