use rocket::local::blocking::Client;

pub fn test_client() -> Client {
    Client::tracked(floor_manager::rocket()).expect("valid rocket instance")
}
