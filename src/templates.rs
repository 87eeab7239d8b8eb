pub const INSTALL_SERVICES_SH: &str = include_str!("../templates/install_services.sh");
