pub mod http_mail;
